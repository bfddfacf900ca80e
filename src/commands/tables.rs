//! Report tables, laid out with the tabled crate.
use crate::utils::{Styling, uwriteln};
use std::io::Write;
use tabled::{
    builder::Builder,
    settings::{Alignment, Padding, Style, object::Columns},
};

struct Column {
    title: String,
    align: Alignment,
    help: String,
}

/// A table with titled columns. They look like this:
/// index  type        start               end               present   (titles)
/// -----  ----        -----               ---               -------
///     0  StackPage   0x00007ffefffec000  0x00007ffefffed000     yes
///
/// index: position in the dump's segment table                        (if explain)
/// type: what the kernel captured
#[derive(Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new() -> Table {
        Table::default()
    }

    pub fn left(mut self, title: &str, help: &str) -> Table {
        self.add_column(title, Alignment::left(), help);
        self
    }

    pub fn right(mut self, title: &str, help: &str) -> Table {
        self.add_column(title, Alignment::right(), help);
        self
    }

    /// One cell per column, in column order.
    pub fn add_row(&mut self, cells: Vec<String>) {
        debug_assert_eq!(cells.len(), self.columns.len());
        let row = cells
            .into_iter()
            .map(|cell| {
                if cell.is_empty() {
                    // empty cells confuse tabled's column widths
                    " ".to_string()
                } else {
                    cell.table_field().to_string()
                }
            })
            .collect();
        self.rows.push(row);
    }

    pub fn writeln(&self, out: &mut impl Write, explain: bool) {
        uwriteln!(out, "{}", self.table_str());
        if explain {
            uwriteln!(out);
            for c in self.columns.iter() {
                uwriteln!(out, "{}", explain_line(&c.title, &c.help));
            }
        }
    }

    fn add_column(&mut self, title: &str, align: Alignment, help: &str) {
        debug_assert!(self.columns.iter().all(|c| c.title != title));
        self.columns.push(Column {
            title: title.to_string(),
            align,
            help: help.to_string(),
        });
    }

    fn table_str(&self) -> String {
        let mut builder = Builder::with_capacity(self.rows.len() + 2, self.columns.len());
        builder.push_record(
            self.columns
                .iter()
                .map(|c| c.title.as_str().table_header().to_string()),
        );
        builder.push_record(
            self.columns
                .iter()
                .map(|c| "-".repeat(c.title.len()).table_sep().to_string()),
        );
        for row in self.rows.iter() {
            builder.push_record(row.iter().cloned());
        }

        let mut table = builder.build();
        for (i, c) in self.columns.iter().enumerate() {
            table.modify(Columns::one(i), c.align);
        }
        table.modify(Columns::first(), Padding::new(0, 1, 0, 0));
        table.with(Style::empty());
        table.to_string()
    }
}

/// Name/value pairs without titles:
/// pid       7
/// cpu       2
///
/// pid: id of the task that crashed           (if explain)
#[derive(Default)]
pub struct Fields {
    rows: Vec<[String; 3]>,
}

impl Fields {
    pub fn new() -> Fields {
        Fields::default()
    }

    pub fn add(&mut self, name: &str, value: impl ToString, help: &str) {
        self.rows.push([
            name.to_string(),
            value.to_string().table_field().to_string(),
            help.to_string(),
        ]);
    }

    pub fn writeln(&self, out: &mut impl Write, explain: bool) {
        let mut builder = Builder::with_capacity(self.rows.len(), 2);
        for [name, value, _] in self.rows.iter() {
            builder.push_record([name.clone(), value.clone()]);
        }
        let mut table = builder.build();
        table.modify(Columns::one(0), Alignment::left());
        table.modify(Columns::one(1), Alignment::left());
        table.modify(Columns::first(), Padding::new(0, 1, 0, 0));
        table.with(Style::empty());
        uwriteln!(out, "{table}");

        if explain {
            uwriteln!(out);
            for [name, _, help] in self.rows.iter() {
                uwriteln!(out, "{}", explain_line(name, help));
            }
        }
    }
}

fn explain_line(name: &str, help: &str) -> String {
    format!("{}: {}", name.explain_title(), help.explain_text())
}
