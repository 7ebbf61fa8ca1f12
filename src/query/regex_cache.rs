use lru::LruCache;
use regex::Regex;
use std::num::NonZeroUsize;
use std::sync::{Mutex, OnceLock};

const REGEX_CACHE_CAPACITY: usize = 64;

static REGEX_CACHE: OnceLock<Mutex<LruCache<String, Regex>>> = OnceLock::new();

fn get_cache() -> &'static Mutex<LruCache<String, Regex>> {
    REGEX_CACHE.get_or_init(|| {
        Mutex::new(LruCache::new(
            NonZeroUsize::new(REGEX_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
        ))
    })
}

pub fn get_or_compile_regex(pattern: &str, flags: &str) -> Result<Regex, regex::Error> {
    let cache_key = format!("{pattern}\0{flags}");

    if let Ok(mut cache) = get_cache().try_lock()
        && let Some(regex) = cache.get(&cache_key) {
            return Ok(regex.clone());
        }

    let mut regex_builder = regex::RegexBuilder::new(pattern);

    if flags.contains('i') {
        regex_builder.case_insensitive(true);
    }
    if flags.contains('m') {
        regex_builder.multi_line(true);
    }
    if flags.contains('s') {
        regex_builder.dot_matches_new_line(true);
    }
    if flags.contains('x') {
        regex_builder.ignore_whitespace(true);
    }

    let regex = regex_builder.build()?;

    if let Ok(mut cache) = get_cache().try_lock() {
        cache.put(cache_key, regex.clone());
    }

    Ok(regex)
}
