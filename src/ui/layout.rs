use {
    crate::{pipeline::LoopStats, state::Snapshot},
    ratatui::{
        layout::{Alignment, Constraint, Layout as RatLayout, Rect},
        style::{Color, Modifier, Style},
        text::{Line, Span},
        widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph},
        Frame,
    },
    std::str::FromStr,
};

/// Bar heights are integers; means are mapped onto 0..=BAR_RESOLUTION
const BAR_RESOLUTION: u64 = 1000;
const BAR_GAP: u16 = 1;
const GROUP_GAP: u16 = 2;
const MAX_BAR_WIDTH: u16 = 12;

const METRIC_A_COLOR: Color = Color::Cyan;
const METRIC_B_COLOR: Color = Color::Yellow;

/// How the two metrics share the value axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartStyle {
    /// Both metrics on one axis, bars side by side per category
    #[default]
    GroupedBar,
    /// Each metric scaled against its own axis (left: A, right: B)
    DualAxis,
}

impl ChartStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartStyle::GroupedBar => "grouped",
            ChartStyle::DualAxis => "dual",
        }
    }
}

impl FromStr for ChartStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grouped" | "grouped-bar" | "grouped_bar" => Ok(ChartStyle::GroupedBar),
            "dual" | "dual-axis" | "dual_axis" => Ok(ChartStyle::DualAxis),
            other => Err(format!("unknown chart style '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub style: ChartStyle,
    pub title: String,
    pub metric_a_label: String,
    pub metric_b_label: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            style: ChartStyle::GroupedBar,
            title: "Weather Flow - Live Category Averages".to_string(),
            metric_a_label: "metric_a".to_string(),
            metric_b_label: "metric_b".to_string(),
        }
    }
}

/// Upper bound of the value axis for each metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisScale {
    pub max_a: f64,
    pub max_b: f64,
}

impl AxisScale {
    pub fn for_snapshot(snapshot: &Snapshot, style: ChartStyle) -> Self {
        let max_a = snapshot.iter().map(|m| m.mean_a).fold(0.0, f64::max);
        let max_b = snapshot.iter().map(|m| m.mean_b).fold(0.0, f64::max);

        match style {
            ChartStyle::GroupedBar => {
                let shared = max_a.max(max_b);
                Self {
                    max_a: shared,
                    max_b: shared,
                }
            }
            ChartStyle::DualAxis => Self { max_a, max_b },
        }
    }
}

/// Map a mean onto a bar height. Negative and non-finite means draw as empty bars.
pub fn bar_height(value: f64, axis_max: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 || axis_max <= 0.0 {
        return 0;
    }
    (((value / axis_max) * BAR_RESOLUTION as f64).round() as u64).min(BAR_RESOLUTION)
}

/// Widest bar that still fits every category group in `inner_width` columns
pub fn bar_width(inner_width: u16, groups: usize) -> u16 {
    if groups == 0 {
        return 1;
    }
    let per_group = inner_width / groups.min(u16::MAX as usize) as u16;
    (per_group.saturating_sub(BAR_GAP + GROUP_GAP) / 2).clamp(1, MAX_BAR_WIDTH)
}

/// Render one full frame: header, chart body, status footer
pub fn render_layout(
    f: &mut Frame,
    area: Rect,
    snapshot: &Snapshot,
    stats: &LoopStats,
    options: &ChartOptions,
) {
    // Wipe whatever the previous frame left behind
    f.render_widget(Clear, area);

    let chunks = RatLayout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header + legend
            Constraint::Min(0),    // Chart
            Constraint::Length(3), // Footer/Status
        ])
        .split(area);

    let scale = AxisScale::for_snapshot(snapshot, options.style);

    render_header(f, chunks[0], options, scale, snapshot.is_empty());
    render_chart(f, chunks[1], snapshot, scale);
    render_footer(f, chunks[2], snapshot, stats);
}

fn render_header(f: &mut Frame, area: Rect, options: &ChartOptions, scale: AxisScale, empty: bool) {
    let header = Block::default()
        .borders(Borders::ALL)
        .title(options.title.as_str());

    let legend = Line::from(vec![
        Span::styled("■ ", Style::default().fg(METRIC_A_COLOR)),
        Span::raw(options.metric_a_label.clone()),
        Span::raw("   "),
        Span::styled("■ ", Style::default().fg(METRIC_B_COLOR)),
        Span::raw(options.metric_b_label.clone()),
        Span::raw(format!("   ({} chart)", options.style.as_str())),
    ]);

    let axes = if empty {
        Line::from("Axes scale to the first observation")
    } else {
        match options.style {
            ChartStyle::GroupedBar => Line::from(format!("Shared axis: 0 - {:.2}", scale.max_a)),
            ChartStyle::DualAxis => Line::from(vec![
                Span::styled(
                    format!("Left axis: {} 0 - {:.2}", options.metric_a_label, scale.max_a),
                    Style::default().fg(METRIC_A_COLOR),
                ),
                Span::raw(" | "),
                Span::styled(
                    format!("Right axis: {} 0 - {:.2}", options.metric_b_label, scale.max_b),
                    Style::default().fg(METRIC_B_COLOR),
                ),
            ]),
        }
    };

    f.render_widget(Paragraph::new(vec![legend, axes]).block(header), area);
}

fn render_chart(f: &mut Frame, area: Rect, snapshot: &Snapshot, scale: AxisScale) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Averages by Category");

    if snapshot.is_empty() {
        let waiting = Paragraph::new("Waiting for observations...")
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(waiting, area);
        return;
    }

    let width = bar_width(area.width.saturating_sub(2), snapshot.len());

    let mut chart = BarChart::default()
        .block(block)
        .bar_width(width)
        .bar_gap(BAR_GAP)
        .group_gap(GROUP_GAP)
        .value_style(Style::default().fg(Color::Black).add_modifier(Modifier::BOLD))
        .max(BAR_RESOLUTION);

    for mean in snapshot {
        let bars = [
            Bar::default()
                .value(bar_height(mean.mean_a, scale.max_a))
                .text_value(format!("{:.2}", mean.mean_a))
                .style(Style::default().fg(METRIC_A_COLOR)),
            Bar::default()
                .value(bar_height(mean.mean_b, scale.max_b))
                .text_value(format!("{:.2}", mean.mean_b))
                .style(Style::default().fg(METRIC_B_COLOR)),
        ];
        let group = BarGroup::default()
            .label(Line::from(mean.category.clone()).alignment(Alignment::Center))
            .bars(&bars);
        chart = chart.data(group);
    }

    f.render_widget(chart, area);
}

fn render_footer(f: &mut Frame, area: Rect, snapshot: &Snapshot, stats: &LoopStats) {
    let text = vec![Line::from(vec![
        Span::styled("Messages: ", Style::default().fg(Color::Cyan)),
        Span::raw(stats.received.to_string()),
        Span::raw(" | "),
        Span::styled("Inserted: ", Style::default().fg(Color::Green)),
        Span::raw(stats.inserted.to_string()),
        Span::raw(" | "),
        Span::styled("Skipped: ", Style::default().fg(Color::Red)),
        Span::raw(stats.skipped.to_string()),
        Span::raw(" | "),
        Span::styled("Categories: ", Style::default().fg(Color::Cyan)),
        Span::raw(snapshot.len().to_string()),
        Span::raw(" | "),
        Span::styled("Last update: ", Style::default().fg(Color::Cyan)),
        Span::raw(super::renderer::format_update_time(stats.last_insert)),
    ])];

    let footer = Block::default()
        .borders(Borders::ALL)
        .title("Status (q or Esc closes the chart once the stream stops)");

    f.render_widget(Paragraph::new(text).block(footer), area);
}
