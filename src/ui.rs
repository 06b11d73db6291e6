use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Sparkline, Table},
    Frame, Terminal,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sales_dashboard::aggregate::{aggregate_with_limit, AggregateResult, Customers, Overview, Products, Sellers};
use sales_dashboard::format::{format_brl, format_share, truncate};
use sales_dashboard::report::{NO_DATA_MESSAGE, NO_MAP_MESSAGE};
use sales_dashboard::{apply_or_unfiltered, region_catalog, FilterError, FilterSpec, SalesTable, View, ViewData};
use std::io;
use std::sync::Arc;

/// Which list the filter panel cursor is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterFocus {
    Categories,
    Regions,
}

pub struct App {
    pub table: Arc<SalesTable>,
    pub spec: FilterSpec,
    pub current_view: View,
    pub categories: Vec<String>,
    pub regions: Vec<String>,
    pub focus: FilterFocus,
    pub cursor: usize,
    pub show_filters: bool,
    pub top_n: usize,
    /// Rebuilt after every filter change
    pub result: AggregateResult,
    pub warning: Option<FilterError>,
    pub filtered_rows: usize,
}

/// One render cycle: filter, fall back if needed, aggregate the active view
fn compute(
    table: &SalesTable,
    spec: &FilterSpec,
    view: View,
    top_n: usize,
) -> (AggregateResult, Option<FilterError>, usize) {
    let outcome = apply_or_unfiltered(table, spec);
    let result = aggregate_with_limit(&outcome.table, view, top_n);
    (result, outcome.warning, outcome.table.len())
}

impl App {
    pub fn new(table: Arc<SalesTable>, top_n: usize) -> Self {
        let spec = FilterSpec::defaults(&table);
        let categories = table.categories();
        let regions = region_catalog(&table);

        let (result, warning, filtered_rows) = compute(&table, &spec, View::Overview, top_n);

        Self {
            table,
            spec,
            current_view: View::Overview,
            categories,
            regions,
            focus: FilterFocus::Categories,
            cursor: 0,
            show_filters: true,
            top_n,
            result,
            warning,
            filtered_rows,
        }
    }

    pub fn recompute(&mut self) {
        let (result, warning, filtered_rows) = compute(&self.table, &self.spec, self.current_view, self.top_n);
        self.result = result;
        self.warning = warning;
        self.filtered_rows = filtered_rows;
    }

    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
        self.recompute();
    }

    pub fn previous_view(&mut self) {
        self.current_view = self.current_view.previous();
        self.recompute();
    }

    fn focused_options(&self) -> &[String] {
        match self.focus {
            FilterFocus::Categories => &self.categories,
            FilterFocus::Regions => &self.regions,
        }
    }

    pub fn switch_focus(&mut self) {
        self.focus = match self.focus {
            FilterFocus::Categories => FilterFocus::Regions,
            FilterFocus::Regions => FilterFocus::Categories,
        };
        self.cursor = 0;
    }

    pub fn next(&mut self) {
        let len = self.focused_options().len();
        if len == 0 {
            return;
        }
        self.cursor = if self.cursor >= len - 1 { 0 } else { self.cursor + 1 };
    }

    pub fn previous(&mut self) {
        let len = self.focused_options().len();
        if len == 0 {
            return;
        }
        self.cursor = if self.cursor == 0 { len - 1 } else { self.cursor - 1 };
    }

    /// Toggle the option under the cursor
    pub fn toggle_selected(&mut self) {
        let Some(option) = self.focused_options().get(self.cursor).cloned() else {
            return;
        };
        self.spec = match self.focus {
            FilterFocus::Categories => self.spec.toggle_category(&option),
            FilterFocus::Regions => self.spec.toggle_region(&option),
        };
        self.recompute();
    }

    /// Move the start date by `days` (may cross the end date; filtering reports it)
    pub fn shift_start(&mut self, days: i64) {
        let start = self.spec.start() + chrono::Duration::days(days);
        self.spec = self.spec.with_dates(start, self.spec.end());
        self.recompute();
    }

    pub fn shift_end(&mut self, days: i64) {
        let end = self.spec.end() + chrono::Duration::days(days);
        self.spec = self.spec.with_dates(self.spec.start(), end);
        self.recompute();
    }

    pub fn reset_filters(&mut self) {
        self.spec = FilterSpec::defaults(&self.table);
        self.recompute();
    }

    pub fn is_selected(&self, option: &str) -> bool {
        match self.focus {
            FilterFocus::Categories => self.spec.categories().contains(option),
            FilterFocus::Regions => self.spec.regions().contains(option),
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal UI stopped");
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => app.next_view(),
                KeyCode::BackTab => app.previous_view(),
                KeyCode::Char('f') => app.show_filters = !app.show_filters,
                KeyCode::Left | KeyCode::Right => app.switch_focus(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected(),
                KeyCode::Char('[') => app.shift_start(-1),
                KeyCode::Char(']') => app.shift_start(1),
                KeyCode::Char('{') => app.shift_end(-1),
                KeyCode::Char('}') => app.shift_end(1),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                KeyCode::Char('r') => app.reset_filters(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with view tabs
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_filters {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(32), // Filter panel
                Constraint::Min(0),     // Active view
            ])
            .split(chunks[1]);

        render_filters(f, content_chunks[0], app);
        render_view(f, content_chunks[1], app);
    } else {
        render_view(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, view) in View::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *view == app.current_view {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(view.title(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Rows: {}/{}", app.filtered_rows, app.table.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!(
            "{} → {}",
            app.spec.start().format("%d/%m/%Y"),
            app.spec.end().format("%d/%m/%Y")
        ),
        Style::default().fg(Color::Cyan),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Sales Dashboard "),
    );

    f.render_widget(header, area);
}

fn render_filters(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = vec![Line::from("")];

    for (focus, title, options, selected) in [
        (FilterFocus::Categories, "  CATEGORIES", &app.categories, app.spec.categories()),
        (FilterFocus::Regions, "  REGIONS", &app.regions, app.spec.regions()),
    ] {
        let title_style = if app.focus == focus {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(Span::styled(title, title_style)));

        for (i, option) in options.iter().enumerate() {
            let marker = if selected.contains(option.as_str()) { "[x]" } else { "[ ]" };
            let under_cursor = app.focus == focus && app.cursor == i;
            let style = if under_cursor {
                Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::raw(if under_cursor { " → " } else { "   " }),
                Span::styled(format!("{} {}", marker, truncate(option, 22)), style),
            ]));
        }
        lines.push(Line::from(""));
    }

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Filters "),
    );
    f.render_widget(panel, area);
}

fn render_view(f: &mut Frame, area: Rect, app: &App) {
    let area = match &app.warning {
        Some(warning) => {
            let parts = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(0)])
                .split(area);
            render_message(
                f,
                parts[0],
                &format!("Error filtering data: {} (showing all rows)", warning),
                Color::Red,
            );
            parts[1]
        }
        None => area,
    };

    match &app.result {
        AggregateResult::Overview(o) => render_overview(f, area, o),
        AggregateResult::Sellers(ViewData::Ready(s)) => render_sellers(f, area, s),
        AggregateResult::Products(ViewData::Ready(p)) => render_products(f, area, p),
        AggregateResult::Customers(ViewData::Ready(c)) => render_customers(f, area, c),
        _ => render_message(f, area, NO_DATA_MESSAGE, Color::Yellow),
    }
}

fn render_message(f: &mut Frame, area: Rect, message: &str, color: Color) {
    let paragraph = Paragraph::new(Line::from(Span::styled(
        format!("  ⚠ {}", message),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)));
    f.render_widget(paragraph, area);
}

/// Bar heights must be integers; amounts are drawn in whole reais
fn bar_value(amount: Decimal) -> u64 {
    amount.round().to_u64().unwrap_or(0)
}

fn amount_bars<'a>(title: &'a str, bars: Vec<Bar<'a>>) -> BarChart<'a> {
    BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(9)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
}

fn header_row(cells: &[&'static str]) -> Row<'static> {
    Row::new(cells.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().bg(Color::DarkGray))
    .height(1)
}

fn bordered(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title)
}

fn render_overview(f: &mut Frame, area: Rect, overview: &Overview) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(35),
            Constraint::Min(0),
        ])
        .split(area);

    let metrics = Line::from(vec![
        Span::styled("  Total sold: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(format_brl(overview.summary.total_amount), Style::default().fg(Color::Green)),
        Span::raw("   "),
        Span::styled("Sales: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::raw(overview.summary.transaction_count.to_string()),
        Span::raw("   "),
        Span::styled("Mean per sale: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled(format_brl(overview.summary.mean_amount), Style::default().fg(Color::Green)),
    ]);
    f.render_widget(Paragraph::new(metrics).block(bordered(" Summary ")), rows[0]);

    match &overview.daily {
        ViewData::Ready(days) => {
            let daily: Vec<u64> = days.iter().map(|d| bar_value(d.amount)).collect();
            let sparkline = Sparkline::default()
                .block(bordered(" Sales per Day "))
                .data(&daily)
                .style(Style::default().fg(Color::Green));
            f.render_widget(sparkline, rows[1]);
        }
        ViewData::NoData => render_message(f, rows[1], NO_DATA_MESSAGE, Color::Yellow),
    }

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(rows[2]);

    match &overview.by_category {
        ViewData::Ready(categories) => {
            let category_bars: Vec<Bar> = categories
                .iter()
                .map(|c| {
                    Bar::default()
                        .label(truncate(&c.category, 9).into())
                        .value(bar_value(c.amount))
                        .text_value(format_brl(c.amount))
                })
                .collect();
            f.render_widget(amount_bars(" Sales per Category ", category_bars), bottom[0]);
        }
        ViewData::NoData => render_message(f, bottom[0], NO_DATA_MESSAGE, Color::Yellow),
    }

    if overview.by_region.is_no_data() {
        render_message(f, bottom[1], NO_DATA_MESSAGE, Color::Yellow);
        return;
    }
    match &overview.map {
        ViewData::Ready(points) => {
            let rows = points.iter().map(|p| {
                Row::new(vec![
                    Cell::from(p.region.clone()),
                    Cell::from(format_brl(p.amount)).style(Style::default().fg(Color::Green)),
                    Cell::from(format!("{:.1}, {:.1}", p.lat, p.lon)),
                ])
            });
            let table = Table::new(
                rows,
                [Constraint::Length(14), Constraint::Length(18), Constraint::Length(14)],
            )
            .header(header_row(&["Region", "Total", "Lat, Lon"]))
            .block(bordered(" Total Sold per Region (Map) "));
            f.render_widget(table, bottom[1]);
        }
        ViewData::NoData => render_message(f, bottom[1], NO_MAP_MESSAGE, Color::Yellow),
    }
}

fn render_sellers(f: &mut Frame, area: Rect, sellers: &Sellers) {
    let parts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let bars: Vec<Bar> = sellers
        .ranking
        .iter()
        .map(|s| {
            Bar::default()
                .label(truncate(&s.seller, 9).into())
                .value(bar_value(s.amount))
                .text_value(format_brl(s.amount))
        })
        .collect();
    f.render_widget(amount_bars(" Total Sales per Seller ", bars), parts[0]);

    let rows = sellers.shares.iter().map(|s| {
        Row::new(vec![
            Cell::from(truncate(&s.seller, 20)),
            Cell::from(format_brl(s.amount)),
            Cell::from(format_share(s.share)).style(Style::default().fg(Color::Cyan)),
        ])
    });
    let table = Table::new(
        rows,
        [Constraint::Length(22), Constraint::Length(18), Constraint::Length(8)],
    )
    .header(header_row(&["Seller", "Total", "Share"]))
    .block(bordered(" Share of Sales "));
    f.render_widget(table, parts[1]);
}

fn render_products(f: &mut Frame, area: Rect, products: &Products) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let bars: Vec<Bar> = products
        .top_by_quantity
        .iter()
        .map(|p| Bar::default().label(truncate(&p.product, 9).into()).value(p.quantity))
        .collect();
    f.render_widget(amount_bars(" Best Selling Products (Quantity) ", bars), parts[0]);

    let rows = products.quantity_vs_amount.iter().map(|p| {
        Row::new(vec![
            Cell::from(truncate(&p.product, 28)),
            Cell::from(p.quantity.to_string()),
            Cell::from(format_brl(p.amount)).style(Style::default().fg(Color::Green)),
        ])
    });
    let table = Table::new(
        rows,
        [Constraint::Length(30), Constraint::Length(10), Constraint::Length(18)],
    )
    .header(header_row(&["Product", "Quantity", "Total"]))
    .block(bordered(" Quantity vs Amount "));
    f.render_widget(table, parts[1]);
}

fn render_customers(f: &mut Frame, area: Rect, customers: &Customers) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(parts[0]);

    let by_amount: Vec<Bar> = customers
        .top_by_amount
        .iter()
        .map(|c| {
            Bar::default()
                .label(truncate(&c.customer, 9).into())
                .value(bar_value(c.amount))
                .text_value(format_brl(c.amount))
        })
        .collect();
    f.render_widget(amount_bars(" Top 10 Customers (Total) ", by_amount), top[0]);

    let by_frequency: Vec<Bar> = customers
        .top_by_frequency
        .iter()
        .map(|c| Bar::default().label(truncate(&c.customer, 9).into()).value(c.purchases as u64))
        .collect();
    f.render_widget(amount_bars(" Most Frequent Customers ", by_frequency), top[1]);

    let rows = customers.details.iter().map(|c| {
        Row::new(vec![
            Cell::from(truncate(&c.customer, 24)),
            Cell::from(format_brl(c.total_amount)).style(Style::default().fg(Color::Green)),
            Cell::from(c.purchases.to_string()),
            Cell::from(c.top_region.clone()),
            Cell::from(c.products.clone()),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(26),
            Constraint::Length(18),
            Constraint::Length(8),
            Constraint::Length(14),
            Constraint::Min(20),
        ],
    )
    .header(header_row(&["Customer", "Total", "Sales", "Region", "Products"]))
    .block(bordered(" Customer Details "));
    f.render_widget(table, parts[1]);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![Span::styled(
        format!(
            " {} categories, {} regions ",
            app.spec.categories().len(),
            app.spec.regions().len()
        ),
        Style::default().fg(Color::Cyan),
    )];

    for (key, label) in [
        ("Tab", " View | "),
        ("←/→", " List | "),
        ("↑/↓", " Nav | "),
        ("Space", " Toggle | "),
        ("[ ]", " Start | "),
        ("{ }", " End | "),
        ("r", " Reset | "),
        ("f", " Filters | "),
    ] {
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use sales_dashboard::load_from_reader;

    fn app() -> App {
        let csv = "\
data,regiao,categoria,vendedor,produto,cliente,valor,quantidade
01/01/2024,Sul,Eletrônicos,Ana,Notebook,Cli A,100,1
02/01/2024,Sudeste,Móveis,Bruno,Cadeira,Cli B,50,2
";
        App::new(Arc::new(load_from_reader(csv.as_bytes()).unwrap()), 10)
    }

    #[test]
    fn test_new_app_shows_everything() {
        let app = app();
        assert_eq!(app.current_view, View::Overview);
        assert_eq!(app.filtered_rows, 2);
        assert!(!app.result.is_no_data());
        assert_eq!(app.regions.len(), 5);
    }

    #[test]
    fn test_view_cycle_recomputes_for_the_active_view() {
        let mut app = app();
        app.next_view();
        assert_eq!(app.result.view(), View::Sellers);
        app.previous_view();
        app.previous_view();
        assert_eq!(app.result.view(), View::Customers);
    }

    #[test]
    fn test_toggling_every_category_empties_the_view() {
        let mut app = app();
        app.toggle_selected();
        app.next();
        app.toggle_selected();
        assert_eq!(app.filtered_rows, 0);
        assert!(app.result.is_no_data());
        let AggregateResult::Overview(overview) = &app.result else {
            panic!("overview tab should hold the overview aggregate");
        };
        assert_eq!(format_brl(overview.summary.total_amount), "R$ 0.00");
        assert_eq!(overview.summary.transaction_count, 0);

        app.reset_filters();
        assert_eq!(app.filtered_rows, 2);
    }

    #[test]
    fn test_region_toggle() {
        let mut app = app();
        app.switch_focus();
        assert_eq!(app.focus, FilterFocus::Regions);
        // catalog: Centro-Oeste, Nordeste, Norte, Sudeste, Sul
        app.cursor = 4;
        assert!(app.is_selected("Sul"));
        app.toggle_selected();
        assert!(!app.is_selected("Sul"));
        assert_eq!(app.filtered_rows, 1);
    }

    #[test]
    fn test_inverted_dates_fall_back_with_warning() {
        let mut app = app();
        app.shift_start(5);
        assert!(app.warning.is_some());
        assert_eq!(app.filtered_rows, 2);

        app.shift_start(-5);
        assert!(app.warning.is_none());
    }

    #[test]
    fn test_cursor_wraps() {
        let mut app = app();
        app.previous();
        assert_eq!(app.cursor, 1);
        app.next();
        assert_eq!(app.cursor, 0);
    }
}
