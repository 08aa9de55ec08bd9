use chrono::NaiveDate;

use crate::table::{Align, Table};

/// Renders period returns as `Date | Return`.
#[derive(Debug, Default)]
pub struct ReturnsRenderer;

impl ReturnsRenderer {
    pub fn render(&self, returns: &[(NaiveDate, f64)]) -> Table {
        let mut table = Table::new(&[1, 1]);
        table.add_separator();
        table
            .add_row()
            .text("Date", Align::Center)
            .text("Return", Align::Center);
        table.add_separator();
        for (date, r) in returns {
            table.add_row().text(date.to_string(), Align::Left).percent(*r);
        }
        table.add_separator();
        table
    }
}

#[cfg(test)]
mod tests {
    use crate::report::ReturnsRenderer;
    use crate::table::Cell;

    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;

    #[test]
    fn render_returns() -> Result<()> {
        let date = NaiveDate::from_ymd_opt(2020, 1, 31).ok_or(anyhow!("invalid date"))?;
        let table = ReturnsRenderer.render(&[(date, 0.5)]);
        assert_eq!(table.rows().len(), 5);
        assert_eq!(table.rows()[3].cells()[1], Cell::Percent(0.5));
        Ok(())
    }
}
