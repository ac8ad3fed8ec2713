//! Client-side record filtering
//!
//! The displayed table is always re-derived from the full record set and an
//! immutable [`FilterCriteria`] snapshot. Criteria are changed through
//! [`FilterCriteria::apply`], which returns a new snapshot.
//!
//! Pipeline order:
//! 1. inactive records are dropped
//! 2. free-text search over document number, address, city and ZIP
//! 3. exact-match selectors (type, city, ZIP, filing month, status)
//! 4. "needs follow-up" (next follow-up date on or before today)

use std::collections::BTreeSet;
use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::{InternalStatus, Record, RecordType};

/// Selector value meaning "no restriction"
pub const ALL: &str = "all";

/// Independent, simultaneously applied filter predicates
///
/// On the JS side every selector is a string where `"all"` means no
/// restriction; inside Rust that is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    pub search: String,
    #[serde(rename = "type", with = "all_or")]
    pub record_type: Option<RecordType>,
    #[serde(with = "all_or")]
    pub city: Option<String>,
    #[serde(with = "all_or")]
    pub zip: Option<String>,
    #[serde(with = "all_or")]
    pub filing_month: Option<String>,
    #[serde(rename = "status", with = "all_or")]
    pub internal_status: Option<InternalStatus>,
    pub needs_follow_up: bool,
}

/// A single change to the criteria
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterAction {
    SetSearch(String),
    SetType(Option<RecordType>),
    SetCity(Option<String>),
    SetZip(Option<String>),
    SetFilingMonth(Option<String>),
    SetStatus(Option<InternalStatus>),
    SetNeedsFollowUp(bool),
    Reset,
}

impl FilterCriteria {
    /// Produce the next criteria snapshot
    pub fn apply(&self, action: FilterAction) -> FilterCriteria {
        let mut next = self.clone();
        match action {
            FilterAction::SetSearch(search) => next.search = search,
            FilterAction::SetType(record_type) => next.record_type = record_type,
            FilterAction::SetCity(city) => next.city = city,
            FilterAction::SetZip(zip) => next.zip = zip,
            FilterAction::SetFilingMonth(month) => next.filing_month = month,
            FilterAction::SetStatus(status) => next.internal_status = status,
            FilterAction::SetNeedsFollowUp(on) => next.needs_follow_up = on,
            FilterAction::Reset => next = FilterCriteria::default(),
        }
        next
    }

    /// True when nothing beyond the inactive exclusion is applied
    pub fn is_default(&self) -> bool {
        self.search.trim().is_empty()
            && self.record_type.is_none()
            && self.city.is_none()
            && self.zip.is_none()
            && self.filing_month.is_none()
            && self.internal_status.is_none()
            && !self.needs_follow_up
    }

    /// Whether a single record survives every predicate
    pub fn matches(&self, record: &Record, today: NaiveDate) -> bool {
        if record.inactive {
            return false;
        }

        let search = self.search.trim();
        if !search.is_empty() && !matches_search(record, search) {
            return false;
        }

        if let Some(record_type) = self.record_type {
            if record.record_type != record_type {
                return false;
            }
        }
        if let Some(city) = &self.city {
            if &record.city != city {
                return false;
            }
        }
        if let Some(zip) = &self.zip {
            if &record.zip != zip {
                return false;
            }
        }
        if let Some(month) = &self.filing_month {
            if record.filing_month.as_ref() != Some(month) {
                return false;
            }
        }
        if let Some(status) = self.internal_status {
            if record.internal_status != status {
                return false;
            }
        }

        !self.needs_follow_up || record.follow_up_due(today)
    }
}

/// Case-folded match on document number, address and city; raw match on ZIP
fn matches_search(record: &Record, search: &str) -> bool {
    let folded = search.to_lowercase();
    record.document_number.to_lowercase().contains(&folded)
        || record.address.to_lowercase().contains(&folded)
        || record.city.to_lowercase().contains(&folded)
        || record.zip.contains(search)
}

/// Records to display, in source order
pub fn filter_records<'a>(
    records: &'a [Record],
    criteria: &FilterCriteria,
    today: NaiveDate,
) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|record| criteria.matches(record, today))
        .collect()
}

/// Choices offered by the city, ZIP and filing month selectors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub cities: Vec<String>,
    pub zips: Vec<String>,
    pub filing_months: Vec<String>,
}

impl FilterOptions {
    /// Distinct, sorted values taken from active records
    pub fn from_records(records: &[Record]) -> Self {
        let mut cities = BTreeSet::new();
        let mut zips = BTreeSet::new();
        let mut months = BTreeSet::new();

        for record in records.iter().filter(|r| !r.inactive) {
            if !record.city.is_empty() {
                cities.insert(record.city.clone());
            }
            if !record.zip.is_empty() {
                zips.insert(record.zip.clone());
            }
            if let Some(month) = &record.filing_month {
                months.insert(month.clone());
            }
        }

        Self {
            cities: cities.into_iter().collect(),
            zips: zips.into_iter().collect(),
            filing_months: months.into_iter().collect(),
        }
    }
}

/// Dashboard counts over active records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStats {
    pub active: usize,
    pub inactive: usize,
    pub mortgage: usize,
    pub tax: usize,
    pub new: usize,
    pub contact_attempted: usize,
    pub monitoring: usize,
    pub dead: usize,
    pub needs_follow_up: usize,
}

impl RecordStats {
    pub fn from_records(records: &[Record], today: NaiveDate) -> Self {
        let mut stats = RecordStats::default();
        for record in records {
            if record.inactive {
                stats.inactive += 1;
                continue;
            }
            stats.active += 1;
            match record.record_type {
                RecordType::Mortgage => stats.mortgage += 1,
                RecordType::Tax => stats.tax += 1,
            }
            match record.internal_status {
                InternalStatus::New => stats.new += 1,
                InternalStatus::ContactAttempted => stats.contact_attempted += 1,
                InternalStatus::Monitoring => stats.monitoring += 1,
                InternalStatus::Dead => stats.dead += 1,
            }
            if record.follow_up_due(today) {
                stats.needs_follow_up += 1;
            }
        }
        stats
    }
}

/// Parse a selector value coming from the UI; `"all"` or blank means `None`
pub fn parse_selector<T>(raw: &str) -> Result<Option<T>, T::Err>
where
    T: FromStr,
{
    match raw.trim() {
        "" | ALL => Ok(None),
        value => value.parse().map(Some),
    }
}

mod all_or {
    use super::*;

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Display,
    {
        match value {
            Some(v) => serializer.collect_str(v),
            None => serializer.serialize_str(ALL),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
        T::Err: Display,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(raw) => parse_selector(&raw).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_record() -> impl Strategy<Value = Record> {
        (
            "[A-Z]{1,2}[0-9]{1,3}",
            prop_oneof![Just(RecordType::Mortgage), Just(RecordType::Tax)],
            "[0-9]{1,4} [A-Za-z]{3,8} St",
            prop_oneof![Just("Reno"), Just("Sparks"), Just("Elko")],
            "89[0-9]{3}",
            prop::option::of(prop_oneof![Just("2024-01"), Just("2024-02")]),
            any::<bool>(),
            prop::sample::select(InternalStatus::ALL.to_vec()),
            prop::option::of(0i64..60),
        )
            .prop_map(
                |(doc, record_type, address, city, zip, month, inactive, status, offset)| Record {
                    document_number: doc,
                    record_type,
                    address,
                    city: city.to_string(),
                    zip,
                    filing_month: month.map(str::to_string),
                    inactive,
                    internal_status: status,
                    notes: None,
                    last_action_date: None,
                    next_follow_up_date: offset.map(|days| {
                        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap() + chrono::Duration::days(days)
                    }),
                },
            )
    }

    fn arb_criteria() -> impl Strategy<Value = FilterCriteria> {
        (
            prop_oneof![Just(String::new()), "[a-z0-9]{1,3}"],
            prop::option::of(prop_oneof![Just(RecordType::Mortgage), Just(RecordType::Tax)]),
            prop::option::of(prop_oneof![Just("Reno".to_string()), Just("Elko".to_string())]),
            prop::option::of(prop::sample::select(InternalStatus::ALL.to_vec())),
            any::<bool>(),
        )
            .prop_map(|(search, record_type, city, status, follow_up)| FilterCriteria {
                search,
                record_type,
                city,
                internal_status: status,
                needs_follow_up: follow_up,
                ..FilterCriteria::default()
            })
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    proptest! {
        /// Property: filtering twice with the same criteria equals filtering once
        #[test]
        fn filtering_is_idempotent(
            records in prop::collection::vec(arb_record(), 0..40),
            criteria in arb_criteria()
        ) {
            let once: Vec<Record> = filter_records(&records, &criteria, today())
                .into_iter()
                .cloned()
                .collect();
            let twice: Vec<Record> = filter_records(&once, &criteria, today())
                .into_iter()
                .cloned()
                .collect();
            prop_assert_eq!(once, twice);
        }

        /// Property: inactive records never survive
        #[test]
        fn inactive_never_shown(
            records in prop::collection::vec(arb_record(), 0..40),
            criteria in arb_criteria()
        ) {
            for record in filter_records(&records, &criteria, today()) {
                prop_assert!(!record.inactive);
            }
        }

        /// Property: output is an order-preserving subsequence of the input
        #[test]
        fn preserves_source_order(
            records in prop::collection::vec(arb_record(), 0..40),
            criteria in arb_criteria()
        ) {
            let shown = filter_records(&records, &criteria, today());
            let mut cursor = 0;
            for record in shown {
                let pos = records[cursor..]
                    .iter()
                    .position(|r| std::ptr::eq(r, record));
                prop_assert!(pos.is_some());
                cursor += pos.unwrap() + 1;
            }
        }

        /// Property: a record matches a search iff the case-folded term is in its
        /// document number, address or city, or the term as typed is in its ZIP
        #[test]
        fn search_matches_iff_substring(
            record in arb_record(),
            search in prop_oneof!["[a-zA-Z0-9]{1,3}", "[0-9]{2,3}", "(St|st|RE|re|Sp|sp|EL|el)"]
        ) {
            let folded = search.to_lowercase();
            let expected = record.document_number.to_lowercase().contains(&folded)
                || record.address.to_lowercase().contains(&folded)
                || record.city.to_lowercase().contains(&folded)
                || record.zip.contains(search.as_str());
            prop_assert_eq!(matches_search(&record, &search), expected);

            let criteria = FilterCriteria::default().apply(FilterAction::SetSearch(search.clone()));
            prop_assert_eq!(criteria.matches(&record, today()), expected && !record.inactive);
        }

        /// Property: follow-up filter keeps exactly the due records
        #[test]
        fn follow_up_matches_date_comparison(record in arb_record()) {
            let criteria = FilterCriteria::default().apply(FilterAction::SetNeedsFollowUp(true));
            let expected = !record.inactive
                && record.next_follow_up_date.map(|d| d <= today()).unwrap_or(false);
            prop_assert_eq!(criteria.matches(&record, today()), expected);
        }
    }
}
