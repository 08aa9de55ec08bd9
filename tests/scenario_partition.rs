use anyhow::{anyhow, Result};
use chrono::NaiveDate;

use libtally::date::{Interval, Partition, Period};

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or(anyhow!("invalid date"))
}

#[test]
fn monthly_truncated_to_last_five() -> Result<()> {
    let period = Period::new(date(2021, 1, 15)?, date(2022, 1, 10)?);
    let partition = Partition::new(period, Interval::Monthly, 5);
    assert_eq!(
        partition.end_dates(),
        &[
            date(2021, 9, 30)?,
            date(2021, 10, 31)?,
            date(2021, 11, 30)?,
            date(2021, 12, 31)?,
            date(2022, 1, 10)?,
        ]
    );
    assert_eq!(partition.size(), 5);
    assert!(partition.contains(date(2022, 1, 10)?));
    assert_eq!(partition.map_to_end(date(2021, 10, 3)?), Some(date(2021, 10, 31)?));
    assert_eq!(partition.map_to_end(date(2022, 1, 11)?), None);
    Ok(())
}

#[test]
fn end_dates_increase_within_period() -> Result<()> {
    let period = Period::new(date(2020, 2, 29)?, date(2021, 3, 1)?);
    for interval in [
        Interval::Once,
        Interval::Daily,
        Interval::Weekly,
        Interval::Monthly,
        Interval::Quarterly,
        Interval::Yearly,
    ] {
        let partition = Partition::new(period, interval, 0);
        let ends = partition.end_dates();
        assert!(ends.windows(2).all(|w| w[0] < w[1]), "{interval}");
        assert!(ends.iter().all(|d| period.contains(*d)), "{interval}");
        assert_eq!(ends.last(), Some(&period.end), "{interval}");
    }
    Ok(())
}
