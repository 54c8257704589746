use crate::domain::analysis::ClientRecord;
use crate::time::dates::format_display_date;
use crate::view::format::format_brl;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub const PAGE_SIZES: [usize; 3] = [10, 15, 30];
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const TIMELINE_SLOTS: usize = 10;

// Page lists longer than this collapse around the current page.
const FULL_PAGE_LIST_MAX: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    ClientName,
    LastPurchaseDate,
    DaysSinceLastPurchase,
    AverageTicketValue,
    TotalRevenue,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::ClientName,
        SortKey::LastPurchaseDate,
        SortKey::DaysSinceLastPurchase,
        SortKey::AverageTicketValue,
        SortKey::TotalRevenue,
    ];

    /// Column name in the service payload.
    pub fn field_name(self) -> &'static str {
        match self {
            SortKey::ClientName => "Cliente",
            SortKey::LastPurchaseDate => "last_purchase_date",
            SortKey::DaysSinceLastPurchase => "days_since_last_purchase",
            SortKey::AverageTicketValue => "average_ticket_value",
            SortKey::TotalRevenue => "total_revenue",
        }
    }

    fn compare(self, a: &ClientRecord, b: &ClientRecord) -> Ordering {
        match self {
            SortKey::ClientName => a.name.cmp(&b.name),
            SortKey::LastPurchaseDate => a.last_purchase_date.cmp(&b.last_purchase_date),
            SortKey::DaysSinceLastPurchase => a
                .days_since_last_purchase
                .cmp(&b.days_since_last_purchase),
            SortKey::AverageTicketValue => a.average_ticket_value.total_cmp(&b.average_ticket_value),
            SortKey::TotalRevenue => a.total_revenue.total_cmp(&b.total_revenue),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

impl FromStr for SortKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SortKey::ALL
            .into_iter()
            .find(|key| key.field_name().eq_ignore_ascii_case(s))
            .or(match s.to_ascii_lowercase().as_str() {
                "client" | "name" => Some(SortKey::ClientName),
                _ => None,
            })
            .ok_or_else(|| anyhow::anyhow!("unknown sort key: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => anyhow::bail!("unknown sort direction: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::TotalRevenue,
            direction: SortDirection::Desc,
        }
    }
}

impl SortState {
    /// Clicking the active column flips it; any other column starts descending.
    pub fn request(self, key: SortKey) -> Self {
        let direction = if self.key == key && self.direction == SortDirection::Desc {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        };
        Self { key, direction }
    }
}

/// Stable sort; each entry keeps its position in the backend list.
pub fn sort_clients(clients: &[ClientRecord], sort: SortState) -> Vec<(usize, &ClientRecord)> {
    let mut indexed: Vec<(usize, &ClientRecord)> = clients.iter().enumerate().collect();
    indexed.sort_by(|(_, a), (_, b)| match sort.direction {
        SortDirection::Asc => sort.key.compare(a, b),
        SortDirection::Desc => sort.key.compare(b, a),
    });
    indexed
}

pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1))
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(usize),
    Ellipsis,
}

pub fn page_numbers(current: usize, total: usize) -> Vec<PageItem> {
    if total <= FULL_PAGE_LIST_MAX {
        return (1..=total).map(PageItem::Page).collect();
    }

    let mut items = vec![PageItem::Page(1)];
    if current > 3 {
        items.push(PageItem::Ellipsis);
    }

    let mut start = current.saturating_sub(1).max(2);
    let mut end = (current + 1).min(total - 1);
    if current <= 3 {
        end = 4;
    } else if current >= total - 2 {
        start = total - 3;
    }
    items.extend((start..=end).map(PageItem::Page));

    if current < total - 2 {
        items.push(PageItem::Ellipsis);
    }
    items.push(PageItem::Page(total));
    items
}

/// Rows per page and current page, as the pagination bar controls them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: usize,
    pub page_size: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pager {
    pub fn set_page_size(&mut self, page_size: usize) -> anyhow::Result<()> {
        anyhow::ensure!(
            PAGE_SIZES.contains(&page_size),
            "rows per page must be one of {PAGE_SIZES:?} (got {page_size})"
        );
        self.page_size = page_size;
        self.page = 1;
        Ok(())
    }

    pub fn go_to(&mut self, page: usize, count: usize) {
        self.page = clamp_page(page, total_pages(count, self.page_size));
    }

    pub fn next(&mut self, count: usize) {
        self.go_to(self.page + 1, count);
    }

    pub fn previous(&mut self, count: usize) {
        self.go_to(self.page.saturating_sub(1), count);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowKey {
    TaxId(String),
    /// Position in the backend list; stable while the same result is shown.
    Position(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineSlot {
    Empty,
    Purchase(NaiveDate),
    LastPurchase { date: NaiveDate, days_inactive: u32 },
}

impl TimelineSlot {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            TimelineSlot::Empty => None,
            TimelineSlot::Purchase(date) | TimelineSlot::LastPurchase { date, .. } => Some(*date),
        }
    }
}

/// Ten slots: empty padding, prior purchases, then the last purchase.
pub fn timeline(client: &ClientRecord) -> Vec<TimelineSlot> {
    let history: Vec<NaiveDate> = client
        .purchase_history
        .iter()
        .copied()
        .filter(|d| *d != client.last_purchase_date)
        .collect();

    let empty_count = (TIMELINE_SLOTS - 1).saturating_sub(history.len());
    let mut slots = Vec::with_capacity(empty_count + history.len() + 1);
    slots.extend(std::iter::repeat(TimelineSlot::Empty).take(empty_count));
    slots.extend(history.into_iter().map(TimelineSlot::Purchase));
    slots.push(TimelineSlot::LastPurchase {
        date: client.last_purchase_date,
        days_inactive: client.days_since_last_purchase,
    });

    let overflow = slots.len().saturating_sub(TIMELINE_SLOTS);
    slots.split_off(overflow)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub key: RowKey,
    pub name: String,
    pub tax_id: Option<String>,
    pub timeline: Vec<TimelineSlot>,
    pub last_purchase: String,
    pub inactive_badge: String,
    pub average_ticket: String,
    pub total_revenue: String,
}

impl TableRow {
    fn from_client(position: usize, client: &ClientRecord) -> Self {
        let key = match &client.tax_id {
            Some(id) => RowKey::TaxId(id.clone()),
            None => RowKey::Position(position),
        };
        Self {
            key,
            name: client.name.clone(),
            tax_id: client.tax_id.clone(),
            timeline: timeline(client),
            last_purchase: format_display_date(client.last_purchase_date),
            inactive_badge: format!("{}d Inactive", client.days_since_last_purchase),
            average_ticket: format_brl(client.average_ticket_value),
            total_revenue: format_brl(client.total_revenue),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub rows: Vec<TableRow>,
    pub sort: SortState,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_clients: usize,
    pub page_numbers: Vec<PageItem>,
}

impl TableView {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn target_label(&self, loading: bool) -> String {
        if loading {
            "Analyzing...".to_string()
        } else {
            format!("{} Targets", self.total_clients)
        }
    }
}

pub fn project(clients: &[ClientRecord], sort: SortState, pager: Pager) -> TableView {
    let total_pages = total_pages(clients.len(), pager.page_size);
    let page = clamp_page(pager.page, total_pages);

    let rows = sort_clients(clients, sort)
        .into_iter()
        .skip((page - 1) * pager.page_size)
        .take(pager.page_size)
        .map(|(position, client)| TableRow::from_client(position, client))
        .collect();

    TableView {
        rows,
        sort,
        page,
        page_size: pager.page_size,
        total_pages,
        total_clients: clients.len(),
        page_numbers: page_numbers(page, total_pages),
    }
}
