use std::cmp::Ordering;

use tracing::trace;

use crate::country::{CountryRow, SortField};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const COMPACT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

/// Filter, sort and page parameters of the table. Lives only as long as the
/// running viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub filter_text: String,
    pub sort_field: Option<SortField>,
    pub sort_direction: SortDirection,
    pub page_index: usize,
    pub page_size: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChange {
    pub index: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortChange {
    pub field: Option<SortField>,
    pub direction: SortDirection,
}

/// A table event. Either part may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableChange {
    pub page: Option<PageChange>,
    pub sort: Option<SortChange>,
}

impl ViewState {
    pub fn with_page_size(page_size: usize) -> Self {
        ViewState {
            filter_text: String::new(),
            sort_field: Some(SortField::Name),
            sort_direction: SortDirection::Asc,
            page_index: 0,
            page_size,
        }
    }

    /// Search box edit. Narrowing the result always jumps back to the first page.
    pub fn on_search_input(&mut self, input: &str) {
        self.filter_text = input.to_lowercase();
        self.page_index = 0;
    }

    pub fn on_table_change(&mut self, change: TableChange) {
        if let Some(page) = change.page {
            self.page_index = page.index;
            self.page_size = page.size;
        }
        if let Some(sort) = change.sort {
            self.sort_field = sort.field;
            self.sort_direction = sort.direction;
        }
    }

    /// Number of pages needed for `total` rows, at least one.
    pub fn page_count(&self, total: usize) -> usize {
        if self.page_size == 0 {
            return 1;
        }
        total.div_ceil(self.page_size).max(1)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryPage {
    pub visible_rows: Vec<CountryRow>,
    /// Rows matching the filter, before pagination.
    pub total_matching_count: usize,
}

fn matches_filter(row: &CountryRow, filter_text: &str) -> bool {
    if filter_text.is_empty() {
        return true;
    }
    [&row.code, &row.name, &row.continent]
        .into_iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(filter_text))
}

// Absent values order below present ones, plain byte-wise comparison otherwise.
fn compare_rows(a: &CountryRow, b: &CountryRow, field: SortField, direction: SortDirection) -> Ordering {
    let ordering = a.field(field).cmp(&b.field(field));
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

/// Filter, sort and slice `rows` for the given view.
///
/// `page_index == 0 && page_size == 0` returns every matching row. This is a
/// leftover of the table widget treating a missing pagination as "show all";
/// callers always pass a positive page size.
pub fn find_countries(rows: &[CountryRow], view: &ViewState) -> CountryPage {
    let mut matching: Vec<&CountryRow> = rows
        .iter()
        .filter(|row| matches_filter(row, &view.filter_text))
        .collect();

    if let Some(field) = view.sort_field {
        // sort_by is stable, equal keys keep their filtered order
        matching.sort_by(|a, b| compare_rows(a, b, field, view.sort_direction));
    }

    let total_matching_count = matching.len();
    let visible_rows = if view.page_index == 0 && view.page_size == 0 {
        matching.into_iter().cloned().collect()
    } else {
        let start = view.page_index.saturating_mul(view.page_size);
        let end = start.saturating_add(view.page_size).min(total_matching_count);
        if start >= end {
            Vec::new()
        } else {
            matching[start..end].iter().map(|&row| row.clone()).collect()
        }
    };

    trace!(
        "find_countries: filter {:?}, sort {:?} {:?}, page {}x{} => {}/{}",
        view.filter_text,
        view.sort_field,
        view.sort_direction,
        view.page_index,
        view.page_size,
        visible_rows.len(),
        total_matching_count
    );

    CountryPage {
        visible_rows,
        total_matching_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> CountryRow {
        CountryRow {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn row(code: &str, name: &str, continent: &str) -> CountryRow {
        CountryRow {
            code: Some(code.to_string()),
            name: Some(name.to_string()),
            emoji: None,
            continent: Some(continent.to_string()),
        }
    }

    fn names(rows: &[CountryRow]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_deref().unwrap_or("")).collect()
    }

    fn three() -> Vec<CountryRow> {
        vec![named("Chad"), named("Benin"), named("Togo")]
    }

    fn view(filter: &str, page_index: usize, page_size: usize) -> ViewState {
        ViewState {
            filter_text: filter.to_string(),
            page_index,
            page_size,
            ..ViewState::default()
        }
    }

    #[test]
    fn first_page_sorted_by_name() {
        let page = find_countries(&three(), &view("", 0, 2));
        assert_eq!(names(&page.visible_rows), vec!["Benin", "Chad"]);
        assert_eq!(page.total_matching_count, 3);
    }

    #[test]
    fn filter_narrows_and_counts_matches() {
        let page = find_countries(&three(), &view("to", 0, 2));
        assert_eq!(names(&page.visible_rows), vec!["Togo"]);
        assert_eq!(page.total_matching_count, 1);
    }

    #[test]
    fn second_page_holds_the_remainder() {
        let page = find_countries(&three(), &view("", 1, 2));
        assert_eq!(names(&page.visible_rows), vec!["Togo"]);
        assert_eq!(page.total_matching_count, 3);
    }

    #[test]
    fn empty_input_gives_empty_page() {
        let page = find_countries(&[], &ViewState::default());
        assert!(page.visible_rows.is_empty());
        assert_eq!(page.total_matching_count, 0);
    }

    #[test]
    fn page_beyond_end_is_empty_but_counted() {
        let page = find_countries(&three(), &view("", 7, 2));
        assert!(page.visible_rows.is_empty());
        assert_eq!(page.total_matching_count, 3);
    }

    #[test]
    fn zero_page_and_size_returns_everything() {
        let page = find_countries(&three(), &view("", 0, 0));
        assert_eq!(names(&page.visible_rows), vec!["Benin", "Chad", "Togo"]);
        assert_eq!(page.total_matching_count, 3);

        let page = find_countries(&three(), &view("", 1, 0));
        assert!(page.visible_rows.is_empty());
    }

    #[test]
    fn filter_matches_code_name_and_continent_only() {
        let rows = vec![
            row("DE", "Germany", "Europe"),
            row("JP", "Japan", "Asia"),
            CountryRow {
                emoji: Some("eu".to_string()),
                ..Default::default()
            },
        ];
        let by_code = find_countries(&rows, &view("jp", 0, 10));
        assert_eq!(names(&by_code.visible_rows), vec!["Japan"]);

        let by_continent = find_countries(&rows, &view("eu", 0, 10));
        assert_eq!(names(&by_continent.visible_rows), vec!["Germany"]);

        let everything = find_countries(&rows, &view("", 0, 10));
        assert_eq!(everything.total_matching_count, 3);
    }

    #[test]
    fn filter_is_case_insensitive_on_row_values() {
        let rows = vec![row("US", "United States", "North America")];
        let mut state = ViewState::default();
        state.on_search_input("NORTH");
        assert_eq!(find_countries(&rows, &state).total_matching_count, 1);
    }

    #[test]
    fn filtering_is_idempotent() {
        let rows = vec![
            row("TG", "Togo", "Africa"),
            row("TO", "Tonga", "Oceania"),
            row("FR", "France", "Europe"),
        ];
        let state = view("to", 0, 0);
        let once = find_countries(&rows, &state).visible_rows;
        let twice = find_countries(&once, &state).visible_rows;
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn sort_is_stable_in_both_directions() {
        let rows = vec![
            row("A1", "a", "Europe"),
            row("B1", "b", "Asia"),
            row("A2", "c", "Europe"),
            row("B2", "d", "Asia"),
            row("A3", "e", "Europe"),
        ];
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let state = ViewState {
                sort_field: Some(SortField::Continent),
                sort_direction: direction,
                ..view("", 0, 0)
            };
            let sorted = find_countries(&rows, &state).visible_rows;
            let asia: Vec<_> = sorted
                .iter()
                .filter(|r| r.continent.as_deref() == Some("Asia"))
                .map(|r| r.code.as_deref().unwrap())
                .collect();
            let europe: Vec<_> = sorted
                .iter()
                .filter(|r| r.continent.as_deref() == Some("Europe"))
                .map(|r| r.code.as_deref().unwrap())
                .collect();
            assert_eq!(asia, vec!["B1", "B2"]);
            assert_eq!(europe, vec!["A1", "A2", "A3"]);
        }
    }

    #[test]
    fn absent_values_sort_below_present_ones() {
        let rows = vec![named("Chad"), CountryRow::default(), named("Benin")];
        let asc = find_countries(&rows, &view("", 0, 0)).visible_rows;
        assert_eq!(asc[0], CountryRow::default());
        assert_eq!(asc[1].name.as_deref(), Some("Benin"));

        let desc_state = ViewState {
            sort_direction: SortDirection::Desc,
            ..view("", 0, 0)
        };
        let desc = find_countries(&rows, &desc_state).visible_rows;
        assert_eq!(desc[0].name.as_deref(), Some("Chad"));
        assert_eq!(desc[2], CountryRow::default());
    }

    #[test]
    fn descending_is_reverse_of_ascending() {
        let rows = vec![
            named("Peru"),
            named("Chile"),
            named("Angola"),
            named("Nepal"),
            named("Fiji"),
        ];
        let asc = find_countries(&rows, &view("", 0, 0)).visible_rows;
        let mut desc = find_countries(
            &rows,
            &ViewState {
                sort_direction: SortDirection::Desc,
                ..view("", 0, 0)
            },
        )
        .visible_rows;
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn missing_sort_field_keeps_filtered_order() {
        let state = ViewState {
            sort_field: SortField::parse("population"),
            ..view("", 0, 0)
        };
        let page = find_countries(&three(), &state);
        assert_eq!(names(&page.visible_rows), vec!["Chad", "Benin", "Togo"]);
    }

    #[test]
    fn pagination_slice_length_invariant() {
        let rows: Vec<CountryRow> = (0..23).map(|i| named(&format!("c{i:02}"))).collect();
        for page_size in 1..=9 {
            for page_index in 0..30 {
                let page = find_countries(&rows, &view("", page_index, page_size));
                let remaining = page.total_matching_count as isize
                    - (page_index * page_size) as isize;
                let expected = remaining.clamp(0, page_size as isize) as usize;
                assert_eq!(page.visible_rows.len(), expected);
                assert_eq!(page.total_matching_count, 23);
            }
        }
    }

    #[test]
    fn search_input_lowercases_and_resets_page() {
        let mut state = ViewState {
            page_index: 4,
            ..ViewState::default()
        };
        state.on_search_input("GeR");
        assert_eq!(state.filter_text, "ger");
        assert_eq!(state.page_index, 0);
    }

    #[test]
    fn table_change_parts_apply_independently() {
        let mut state = ViewState::default();
        state.on_table_change(TableChange {
            page: Some(PageChange { index: 2, size: 5 }),
            sort: None,
        });
        assert_eq!((state.page_index, state.page_size), (2, 5));
        assert_eq!(state.sort_field, Some(SortField::Name));

        state.on_table_change(TableChange {
            page: None,
            sort: Some(SortChange {
                field: Some(SortField::Code),
                direction: SortDirection::Desc,
            }),
        });
        assert_eq!((state.page_index, state.page_size), (2, 5));
        assert_eq!(state.sort_field, Some(SortField::Code));
        assert_eq!(state.sort_direction, SortDirection::Desc);

        let before = state.clone();
        state.on_table_change(TableChange::default());
        assert_eq!(state, before);
    }

    #[test]
    fn page_count_rounds_up() {
        let state = ViewState::with_page_size(COMPACT_PAGE_SIZE);
        assert_eq!(state.page_count(0), 1);
        assert_eq!(state.page_count(5), 1);
        assert_eq!(state.page_count(6), 2);
        assert_eq!(ViewState::with_page_size(0).page_count(10), 1);
    }
}
