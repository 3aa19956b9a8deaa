// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Newest-first paging over the ledger, grouped by calendar day.

use std::collections::HashSet;

use chrono::{Local, NaiveDate, TimeZone};
use rusqlite::{params, Connection};
use tracing::{debug, warn};

use crate::error::PersistenceError;
use crate::ledger::{query_transactions, LedgerStore};
use crate::models::{GroupedSection, NewTransaction, Transaction};

pub type DaySection = GroupedSection<NaiveDate, Transaction>;

/// Up to `limit` rows, newest first, skipping `offset * limit` rows.
/// An empty result means the ledger is exhausted.
pub fn fetch_page(
    conn: &Connection,
    limit: usize,
    offset: usize,
) -> Result<Vec<Transaction>, PersistenceError> {
    // SQLite reads a negative LIMIT as unbounded and a negative OFFSET as zero.
    let Some(skip) = offset
        .checked_mul(limit)
        .and_then(|s| i64::try_from(s).ok())
    else {
        debug!(limit, offset, "page lies past any possible row");
        return Ok(Vec::new());
    };
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    debug!(limit, offset, skip, "fetching page");
    query_transactions(
        conn,
        "SELECT id, date, amount, type, category FROM transactions
         ORDER BY date DESC, id DESC LIMIT ?1 OFFSET ?2",
        params![limit, skip],
    )
}

/// Re-fetches from the top, capped at `count` rows.
pub fn refresh_limit(conn: &Connection, count: usize) -> Result<Vec<Transaction>, PersistenceError> {
    fetch_page(conn, count, 0)
}

/// Groups by the local calendar day.
pub fn append_and_regroup(existing: Vec<Transaction>, new: Vec<Transaction>) -> Vec<DaySection> {
    append_and_regroup_in(&Local, existing, new)
}

/// Concatenates and regroups by calendar day in `tz`. Rows are newest first
/// within a day, equal dates keep their input order, days are newest first.
pub fn append_and_regroup_in<Tz: TimeZone>(
    tz: &Tz,
    existing: Vec<Transaction>,
    new: Vec<Transaction>,
) -> Vec<DaySection> {
    let mut rows = existing;
    rows.extend(new);
    let mut sections = GroupedSection::group(
        rows,
        |t| t.date.with_timezone(tz).date_naive(),
        |a, b| b.date.cmp(&a.date),
    );
    sections.reverse();
    sections
}

pub fn flatten(sections: &[DaySection]) -> Vec<Transaction> {
    sections.iter().flat_map(|s| s.rows.iter().cloned()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Idle,
    Loading,
    Loaded,
    LoadingMore,
    /// Terminal for the lifetime of the feed.
    Exhausted,
}

/// One list session: loaded rows, their day groups and the paging cursor.
#[derive(Debug)]
pub struct TransactionFeed<Tz: TimeZone = Local> {
    tz: Tz,
    page_size: usize,
    next_page: usize,
    state: FeedState,
    sections: Vec<DaySection>,
}

impl TransactionFeed<Local> {
    pub fn new(page_size: usize) -> Self {
        Self::with_timezone(page_size, Local)
    }
}

impl<Tz: TimeZone> TransactionFeed<Tz> {
    pub fn with_timezone(page_size: usize, tz: Tz) -> Self {
        Self {
            tz,
            page_size: page_size.max(1),
            next_page: 0,
            state: FeedState::Idle,
            sections: Vec::new(),
        }
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    pub fn sections(&self) -> &[DaySection] {
        &self.sections
    }

    pub fn all_transactions_received(&self) -> bool {
        self.state == FeedState::Exhausted
    }

    pub fn loaded_count(&self) -> usize {
        self.sections.iter().map(|s| s.rows.len()).sum()
    }

    pub fn rows(&self) -> Vec<Transaction> {
        flatten(&self.sections)
    }

    /// Starts over from the first page.
    pub fn load_first(&mut self, conn: &Connection) -> Result<bool, PersistenceError> {
        self.sections.clear();
        self.next_page = 0;
        self.state = FeedState::Loading;
        self.fetch_next(conn)
    }

    /// Appends the next page. Returns `false` once nothing more can be loaded.
    pub fn load_more(&mut self, conn: &Connection) -> Result<bool, PersistenceError> {
        match self.state {
            FeedState::Idle => self.load_first(conn),
            FeedState::Loaded => {
                self.state = FeedState::LoadingMore;
                self.fetch_next(conn)
            }
            FeedState::Loading | FeedState::LoadingMore | FeedState::Exhausted => Ok(false),
        }
    }

    /// Stores `new` and redraws the list one row longer, keeping the cursor.
    pub fn record(
        &mut self,
        store: &LedgerStore<'_>,
        new: NewTransaction,
    ) -> Result<Transaction, PersistenceError> {
        let tx = store.add_transaction(new)?;
        self.refresh(store.connection(), self.loaded_count() + 1)?;
        Ok(tx)
    }

    /// Replaces the visible rows with the newest `count` rows.
    pub fn refresh(&mut self, conn: &Connection, count: usize) -> Result<(), PersistenceError> {
        let rows = refresh_limit(conn, count)?;
        self.sections = append_and_regroup_in(&self.tz, Vec::new(), rows);
        if self.state == FeedState::Idle && !self.sections.is_empty() {
            self.state = FeedState::Loaded;
        }
        Ok(())
    }

    /// Walks forward until a page adds unseen rows or the ledger runs out.
    fn fetch_next(&mut self, conn: &Connection) -> Result<bool, PersistenceError> {
        loop {
            let rows = match fetch_page(conn, self.page_size, self.next_page) {
                Ok(rows) => rows,
                Err(e) => {
                    warn!(error = %e, page = self.next_page, "page fetch failed");
                    self.state = if self.loaded_count() == 0 {
                        FeedState::Idle
                    } else {
                        FeedState::Loaded
                    };
                    return Err(e);
                }
            };
            if rows.is_empty() {
                debug!(page = self.next_page, "all transactions received");
                self.state = FeedState::Exhausted;
                return Ok(false);
            }
            self.next_page += 1;

            let existing = flatten(&self.sections);
            // A refresh after an insert shifts later pages by one row.
            let seen: HashSet<i64> = existing.iter().map(|t| t.id).collect();
            let fresh: Vec<Transaction> =
                rows.into_iter().filter(|t| !seen.contains(&t.id)).collect();
            if fresh.is_empty() {
                continue;
            }
            self.sections = append_and_regroup_in(&self.tz, existing, fresh);
            self.state = FeedState::Loaded;
            return Ok(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExpenseCategory, TransactionType};
    use chrono::{DateTime, Utc};

    fn tx(id: i64, date: &str) -> Transaction {
        Transaction {
            id,
            amount: "-0.1".parse().unwrap(),
            r#type: TransactionType::Expense,
            category: Some(ExpenseCategory::Other),
            date: DateTime::parse_from_rfc3339(date).unwrap().with_timezone(&Utc),
        }
    }

    #[test]
    fn days_and_rows_are_newest_first() {
        let sections = append_and_regroup_in(
            &Utc,
            vec![tx(1, "2024-03-16T08:00:00Z"), tx(2, "2024-03-17T08:00:00Z")],
            vec![tx(3, "2024-03-17T20:00:00Z"), tx(4, "2024-03-16T23:59:59Z")],
        );
        let days: Vec<String> = sections.iter().map(|s| s.headline.to_string()).collect();
        assert_eq!(days, vec!["2024-03-17", "2024-03-16"]);
        let ids: Vec<i64> = flatten(&sections).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 2, 4, 1]);
    }

    #[test]
    fn equal_dates_keep_input_order() {
        let sections = append_and_regroup_in(
            &Utc,
            vec![tx(7, "2024-03-16T08:00:00Z"), tx(5, "2024-03-16T08:00:00Z")],
            vec![tx(6, "2024-03-16T08:00:00Z")],
        );
        let ids: Vec<i64> = sections[0].rows.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![7, 5, 6]);
    }

    #[test]
    fn day_key_follows_time_zone() {
        let offset = chrono::FixedOffset::east_opt(3 * 3600).unwrap();
        let sections = append_and_regroup_in(
            &offset,
            vec![tx(1, "2024-03-16T22:30:00Z")],
            Vec::new(),
        );
        assert_eq!(sections[0].headline.to_string(), "2024-03-17");
    }

    #[test]
    fn regrouping_is_idempotent() {
        let once = append_and_regroup_in(
            &Utc,
            vec![
                tx(1, "2024-03-15T10:00:00Z"),
                tx(2, "2024-03-17T10:00:00Z"),
                tx(3, "2024-03-17T10:00:00Z"),
            ],
            vec![tx(4, "2024-03-16T10:00:00Z")],
        );
        let twice = append_and_regroup_in(&Utc, flatten(&once), Vec::new());
        assert_eq!(once, twice);
    }
}
