use serde::Deserialize;

/// One country record as returned by the GraphQL `countries` query.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCountry {
    pub code: Option<String>,
    pub name: Option<String>,
    pub emoji: Option<String>,
    pub continent: Option<RawContinent>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawContinent {
    pub name: Option<String>,
}

/// Flat display row. `continent` only ever holds the continent name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryRow {
    pub code: Option<String>,
    pub name: Option<String>,
    pub emoji: Option<String>,
    pub continent: Option<String>,
}

impl CountryRow {
    pub fn field(&self, field: SortField) -> Option<&str> {
        match field {
            SortField::Code => self.code.as_deref(),
            SortField::Name => self.name.as_deref(),
            SortField::Emoji => self.emoji.as_deref(),
            SortField::Continent => self.continent.as_deref(),
        }
    }
}

impl From<RawCountry> for CountryRow {
    fn from(raw: RawCountry) -> Self {
        CountryRow {
            code: raw.code,
            name: raw.name,
            emoji: raw.emoji,
            continent: raw.continent.and_then(|c| c.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Code,
    Name,
    Emoji,
    Continent,
}

impl SortField {
    /// Column order of the table.
    pub const ALL: [SortField; 4] = [
        SortField::Code,
        SortField::Name,
        SortField::Emoji,
        SortField::Continent,
    ];

    /// Resolve a column key. Unknown keys yield `None`, which the reducer
    /// treats as "leave the rows unsorted".
    pub fn parse(key: &str) -> Option<SortField> {
        match key {
            "code" => Some(SortField::Code),
            "name" => Some(SortField::Name),
            "emoji" => Some(SortField::Emoji),
            "continent" => Some(SortField::Continent),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            SortField::Code => "code",
            SortField::Name => "name",
            SortField::Emoji => "emoji",
            SortField::Continent => "continent",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SortField::Code => "Code",
            SortField::Name => "Name",
            SortField::Emoji => "Emoji",
            SortField::Continent => "Continent",
        }
    }

    // The flag column is display only
    pub fn sortable(&self) -> bool {
        !matches!(self, SortField::Emoji)
    }
}

/// Flatten raw records into display rows, one for one and in order.
/// A missing collection (load pending or failed) gives no rows.
pub fn project_rows(countries: Option<&[RawCountry]>) -> Vec<CountryRow> {
    countries
        .unwrap_or_default()
        .iter()
        .cloned()
        .map(CountryRow::from)
        .collect()
}
