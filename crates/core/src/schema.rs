//! Closed registry of queryable meet-result columns.
//!
//! The column set is fixed at compile time and immutable for the life of the
//! process. Nothing outside this list may appear in a compiled query; the
//! compiler rejects unknown names before any text reaches the store.

/// Primitive value kind of a column as stored in the meet-results table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Numeric,
}

/// One declared column: its exact store-side name and value kind.
#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn text(name: &'static str) -> ColumnDef {
    ColumnDef { name, kind: ColumnKind::Text }
}

const fn numeric(name: &'static str) -> ColumnDef {
    ColumnDef { name, kind: ColumnKind::Numeric }
}

/// Every queryable column, in the order the store projects them.
pub static COLUMNS: &[ColumnDef] = &[
    text("Name"),
    text("Sex"),
    text("Event"),
    text("Equipment"),
    numeric("Age"),
    text("AgeClass"),
    text("BirthYearClass"),
    text("Division"),
    numeric("BodyweightKg"),
    text("WeightClassKg"),
    numeric("Squat1Kg"),
    numeric("Squat2Kg"),
    numeric("Squat3Kg"),
    numeric("Squat4Kg"),
    numeric("Best3SquatKg"),
    numeric("Bench1Kg"),
    numeric("Bench2Kg"),
    numeric("Bench3Kg"),
    numeric("Bench4Kg"),
    numeric("Best3BenchKg"),
    numeric("Deadlift1Kg"),
    numeric("Deadlift2Kg"),
    numeric("Deadlift3Kg"),
    numeric("Deadlift4Kg"),
    numeric("Best3DeadliftKg"),
    numeric("TotalKg"),
    text("Place"),
    numeric("Dots"),
    numeric("Wilks"),
    numeric("Glossbrenner"),
    numeric("Goodlift"),
    text("Tested"),
    text("Country"),
    text("State"),
    text("Federation"),
    text("ParentFederation"),
    text("Date"),
    text("MeetCountry"),
    text("MeetState"),
    text("MeetTown"),
    text("MeetName"),
    text("Sanctioned"),
];

/// Whether `name` is a declared column. Case-sensitive: the store is.
pub fn contains(name: &str) -> bool {
    COLUMNS.iter().any(|column| column.name == name)
}

/// Value kind of a declared column, `None` for unknown names.
pub fn kind_of(name: &str) -> Option<ColumnKind> {
    COLUMNS.iter().find(|column| column.name == name).map(|column| column.kind)
}

/// All column names in declared order.
pub fn names() -> impl Iterator<Item = &'static str> {
    COLUMNS.iter().map(|column| column.name)
}

/// Comma-joined projection list for SELECT clauses.
pub fn select_list() -> String {
    let mut list = String::new();
    for (index, column) in COLUMNS.iter().enumerate() {
        if index > 0 {
            list.push_str(", ");
        }
        list.push_str(column.name);
    }
    list
}
