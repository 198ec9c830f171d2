use serde_json::{Map, Value};
use tabular::{Row, Table};

/// Rows of one listing, printable as a table or as a JSON array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Listing {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn render_table(&self) -> String {
        let spec = vec!["{:<}"; self.headers.len()].join("  ");
        let mut table = Table::new(&spec)
            .with_row(Row::from_cells(self.headers.iter().map(|h| h.to_uppercase())));
        for row in &self.rows {
            table.add_row(Row::from_cells(row.iter().cloned()));
        }
        table.to_string()
    }

    pub fn to_json(&self) -> Value {
        Value::Array(
            self.rows
                .iter()
                .map(|row| {
                    let obj: Map<String, Value> = self
                        .headers
                        .iter()
                        .zip(row)
                        .map(|(h, v)| (h.to_string(), Value::String(v.clone())))
                        .collect();
                    Value::Object(obj)
                })
                .collect(),
        )
    }

    pub fn print(&self, json: bool) {
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&self.to_json()).unwrap_or_default()
            );
        } else {
            print!("{}", self.render_table());
        }
    }
}
