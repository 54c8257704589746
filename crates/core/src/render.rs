//! Plain-text rendering of the dashboard for terminals.

use crate::dashboard::Dashboard;
use crate::view::chart::ChartBar;
use crate::view::feedback::Tone;
use crate::view::table::{PageItem, SortDirection, TableView, TimelineSlot};
use std::fmt::{self, Write};

const CHART_BAR_WIDTH: usize = 40;
const NAME_WIDTH: usize = 28;

const GUIDE_STEPS: [(&str, &str); 3] = [
    (
        "Upload Dataset",
        "Select your .CSV file using semicolon (;) as the delimiter.",
    ),
    (
        "Set Threshold",
        "Define the inactivity period. 60 days is the default used to identify churn.",
    ),
    (
        "Analyze",
        "Run the analysis to generate BI insights and recovery opportunities.",
    ),
];

pub fn render_dashboard<W: Write>(out: &mut W, dashboard: &Dashboard, online: bool) -> fmt::Result {
    let status = if online { "● online" } else { "○ offline" };
    writeln!(out, "SALES RECOVERY BI  [{status}]")?;
    writeln!(out)?;

    if let Some(msg) = dashboard.feedback() {
        let tag = match msg.tone {
            Tone::Error => "ERROR",
            Tone::Success => "OK",
        };
        writeln!(out, "[{tag}] {}", msg.text)?;
        writeln!(out)?;
    }

    render_upload_panel(out, dashboard)?;

    if dashboard.shows_guide() {
        render_guide(out)?;
    }

    if dashboard.dashboard_visible() {
        render_kpis(out, dashboard)?;
        render_chart(out, &dashboard.chart())?;
        render_table(out, &dashboard.table(), dashboard.is_loading())?;
    }
    Ok(())
}

fn render_upload_panel<W: Write>(out: &mut W, dashboard: &Dashboard) -> fmt::Result {
    match dashboard.selected_file() {
        Some(file) => writeln!(
            out,
            "Dataset: {} ({} bytes), ready for BI processing",
            file.file_name,
            file.len()
        )?,
        None => writeln!(out, "Dataset: none selected (CSV format required, semicolon separated)")?,
    }

    let flag = if dashboard.threshold_below_minimum() {
        "  (below minimum)"
    } else {
        ""
    };
    writeln!(
        out,
        "Inactivity threshold: {} days{flag}",
        dashboard.threshold_input()
    )?;
    writeln!(out)
}

fn render_guide<W: Write>(out: &mut W) -> fmt::Result {
    for (idx, (title, text)) in GUIDE_STEPS.iter().enumerate() {
        writeln!(out, "Step {:02}  {}: {text}", idx + 1, title.to_uppercase())?;
    }
    writeln!(out)
}

fn render_kpis<W: Write>(out: &mut W, dashboard: &Dashboard) -> fmt::Result {
    if dashboard.is_loading() {
        writeln!(out, "Analyzing dataset...")?;
        return writeln!(out);
    }

    for card in dashboard.kpis() {
        writeln!(out, "{:<24} {:>18}   {}", card.label, card.value, card.trend)?;
    }

    let goal = dashboard.operational_goal();
    writeln!(
        out,
        "Operational daily goal: {} calls / day to clear {} clients in a {}-day cycle",
        goal.calls_per_day, goal.total_clients, goal.working_days
    )?;
    writeln!(out)
}

fn render_chart<W: Write>(out: &mut W, bars: &[ChartBar]) -> fmt::Result {
    if bars.is_empty() {
        return Ok(());
    }

    writeln!(out, "TOP {} RECOVERY OPPORTUNITIES", bars.len())?;
    for bar in bars {
        let filled = ((bar.height_percent / 100.0) * CHART_BAR_WIDTH as f64).round() as usize;
        let marker = if bar.leader { '█' } else { '▒' };
        writeln!(
            out,
            "{:<w$} {:<bw$} {}",
            fit(&bar.label, NAME_WIDTH),
            marker.to_string().repeat(filled.min(CHART_BAR_WIDTH)),
            bar.value_label,
            w = NAME_WIDTH,
            bw = CHART_BAR_WIDTH,
        )?;
    }
    writeln!(out)
}

fn render_table<W: Write>(out: &mut W, view: &TableView, loading: bool) -> fmt::Result {
    if !loading && view.total_clients == 0 {
        return Ok(());
    }

    let arrow = match view.sort.direction {
        SortDirection::Asc => "↑",
        SortDirection::Desc => "↓",
    };
    writeln!(
        out,
        "STRATEGIC RECOVERY QUEUE  {}  (sorted by {} {arrow})",
        view.target_label(loading),
        view.sort.key
    )?;
    if loading {
        return writeln!(out);
    }

    writeln!(
        out,
        "{:<w$} {:<10} {:<12} {:>14} {:>16}",
        "Client",
        "Timeline",
        "Last",
        "Avg. ticket",
        "Recovery impact",
        w = NAME_WIDTH
    )?;
    for row in &view.rows {
        let timeline: String = row.timeline.iter().map(timeline_glyph).collect();
        writeln!(
            out,
            "{:<w$} {timeline} {:<12} {:>14} {:>16}",
            fit(&row.name, NAME_WIDTH),
            row.last_purchase,
            row.average_ticket,
            row.total_revenue,
            w = NAME_WIDTH
        )?;
        writeln!(
            out,
            "{:<w$} {:<10} {}",
            row.tax_id.as_deref().unwrap_or(""),
            "",
            row.inactive_badge,
            w = NAME_WIDTH
        )?;
    }

    let pages: Vec<String> = view
        .page_numbers
        .iter()
        .map(|item| match item {
            PageItem::Page(p) if *p == view.page => format!("[{p}]"),
            PageItem::Page(p) => p.to_string(),
            PageItem::Ellipsis => "…".to_string(),
        })
        .collect();
    writeln!(
        out,
        "Rows per page: {}   {} {} {}",
        view.page_size,
        if view.has_previous() { "‹" } else { " " },
        pages.join(" "),
        if view.has_next() { "›" } else { " " },
    )
}

fn timeline_glyph(slot: &TimelineSlot) -> char {
    match slot {
        TimelineSlot::Empty => '·',
        TimelineSlot::Purchase(_) => '▮',
        TimelineSlot::LastPurchase { .. } => '◆',
    }
}

fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}
