use super::Component;
use super::view_layout::{ColorScheme, Styles};
use crate::backend::MetricSeries;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Sparkline},
};

/// Sparkline and summary statistics for one metric series.
pub struct MetricsPanel<'a> {
    series: Option<&'a MetricSeries>,
}

impl<'a> MetricsPanel<'a> {
    pub fn new(series: Option<&'a MetricSeries>) -> Self {
        Self { series }
    }

    /// Points scaled onto a u64 range the sparkline can draw; negative
    /// values are shifted up so the minimum sits at zero.
    pub fn scaled_points(series: &MetricSeries) -> Vec<u64> {
        let floor = series.points.iter().map(|p| p.value).fold(f64::INFINITY, f64::min);
        let floor = if floor.is_finite() { floor.min(0.0) } else { 0.0 };
        series
            .points
            .iter()
            .map(|p| ((p.value - floor) * 100.0).round().max(0.0) as u64)
            .collect()
    }
}

impl Component for MetricsPanel<'_> {
    fn render(&mut self, f: &mut Frame, area: Rect) {
        let Some(series) = self.series else {
            let empty = Paragraph::new("No metric selected")
                .style(Styles::dimmed())
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(empty, area);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(6)])
            .split(area);

        let data = Self::scaled_points(series);
        let sparkline = Sparkline::default()
            .block(
                Block::default()
                    .title(format!(" {} ", series.name))
                    .borders(Borders::ALL),
            )
            .data(&data)
            .style(Style::default().fg(ColorScheme::PRIMARY));
        f.render_widget(sparkline, chunks[0]);

        let unit = series.unit.as_deref().unwrap_or("");
        let stat = |label: &'static str, value: f64| {
            Line::from(vec![
                Span::styled(format!("{label:<8}"), Styles::label()),
                Span::raw(format!("{value:.3}{unit}")),
            ])
        };
        let mut lines = vec![
            stat("latest", series.latest),
            stat("min", series.min),
            stat("avg", series.avg),
            stat("max", series.max),
        ];
        if let (Some(first), Some(last)) = (series.points.first(), series.points.last()) {
            lines.push(Line::styled(
                format!(
                    "{} → {}",
                    first.timestamp.format("%H:%M:%S"),
                    last.timestamp.format("%H:%M:%S")
                ),
                Styles::dimmed(),
            ));
        }
        let stats = Paragraph::new(lines).block(Block::default().borders(Borders::LEFT | Borders::RIGHT | Borders::BOTTOM));
        f.render_widget(stats, chunks[1]);
    }
}
