use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub day: String,
    pub start: String,
    pub end: String,
}

/// Weekly working hours a vendor accepts bookings in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VendorAvailability {
    pub slots: Vec<TimeSlot>,
}

impl VendorAvailability {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let availability: VendorAvailability = serde_json::from_str(s)?;
        availability.validate()?;
        Ok(availability)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for slot in &self.slots {
            parse_weekday(&slot.day)?;
            let start = parse_time(&slot.start)?;
            let end = parse_time(&slot.end)?;
            if start >= end {
                return Err(anyhow::anyhow!(
                    "slot start must be before end: {}-{}",
                    slot.start,
                    slot.end
                ));
            }
        }
        Ok(())
    }

    pub fn is_available(&self, dt: &chrono::NaiveDateTime) -> bool {
        let weekday = dt.format("%a").to_string().to_lowercase();
        let time = dt.format("%H:%M").to_string();

        self.slots.iter().any(|slot| {
            slot.day.to_lowercase() == weekday && time >= slot.start && time < slot.end
        })
    }

    pub fn to_human_readable(&self) -> String {
        if self.slots.is_empty() {
            return String::new();
        }

        let day_order = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

        let mut sorted_slots = self.slots.clone();
        sorted_slots.sort_by_key(|s| {
            day_order
                .iter()
                .position(|d| *d == s.day.to_lowercase())
                .unwrap_or(7)
        });

        sorted_slots
            .iter()
            .map(|s| {
                let day = capitalize(&s.day);
                format!("{day}: {}-{}", s.start, s.end)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().to_string() + &c.as_str().to_lowercase(),
    }
}

fn parse_weekday(s: &str) -> anyhow::Result<()> {
    match s.to_lowercase().as_str() {
        "mon" | "tue" | "wed" | "thu" | "fri" | "sat" | "sun" => Ok(()),
        _ => Err(anyhow::anyhow!("invalid weekday: {s}")),
    }
}

/// Parses `HH:MM` into minutes past midnight.
fn parse_time(s: &str) -> anyhow::Result<u32> {
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("invalid time format: {s}"))?;
    if h.len() != 2 || m.len() != 2 {
        return Err(anyhow::anyhow!("invalid time format: {s}"));
    }
    let hour: u32 = h
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = m
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    if hour > 23 || minute > 59 {
        return Err(anyhow::anyhow!("time out of range: {s}"));
    }
    Ok(hour * 60 + minute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    const WEEKDAYS: &str = r#"{"slots":[{"day":"mon","start":"09:00","end":"17:00"},{"day":"tue","start":"09:00","end":"17:00"}]}"#;

    #[test]
    fn test_parse_valid_json() {
        let avail = VendorAvailability::from_json(WEEKDAYS).unwrap();
        assert_eq!(avail.slots.len(), 2);
        assert_eq!(avail.slots[1].day, "tue");
    }

    #[test]
    fn test_rejects_bad_slots() {
        assert!(VendorAvailability::from_json("not json").is_err());
        assert!(VendorAvailability::from_json(
            r#"{"slots":[{"day":"xyz","start":"09:00","end":"17:00"}]}"#
        )
        .is_err());
        assert!(VendorAvailability::from_json(
            r#"{"slots":[{"day":"mon","start":"25:00","end":"17:00"}]}"#
        )
        .is_err());
        assert!(VendorAvailability::from_json(
            r#"{"slots":[{"day":"mon","start":"9:00","end":"17:00"}]}"#
        )
        .is_err());
        assert!(VendorAvailability::from_json(
            r#"{"slots":[{"day":"mon","start":"17:00","end":"09:00"}]}"#
        )
        .is_err());
    }

    #[test]
    fn test_is_available() {
        let avail = VendorAvailability::from_json(WEEKDAYS).unwrap();
        // 2025-06-16 is a Monday
        assert!(avail.is_available(&dt("2025-06-16 09:00")));
        assert!(avail.is_available(&dt("2025-06-16 16:59")));
        assert!(!avail.is_available(&dt("2025-06-16 17:00")));
        assert!(!avail.is_available(&dt("2025-06-16 08:00")));
        // 2025-06-18 is a Wednesday
        assert!(!avail.is_available(&dt("2025-06-18 10:00")));
    }

    #[test]
    fn test_to_human_readable() {
        let json = r#"{"slots":[{"day":"fri","start":"10:00","end":"16:00"},{"day":"mon","start":"09:00","end":"17:00"}]}"#;
        let avail = VendorAvailability::from_json(json).unwrap();
        assert_eq!(
            avail.to_human_readable(),
            "Mon: 09:00-17:00, Fri: 10:00-16:00"
        );
        assert_eq!(VendorAvailability::default().to_human_readable(), "");
    }
}
