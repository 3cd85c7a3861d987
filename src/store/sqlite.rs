use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};
use tracing::{debug, error};

use crate::app::{HarvestError, Result};
use crate::domain::{JobListing, Source};
use crate::store::Store;

const DATE_FORMAT: &str = "%Y-%m-%d";

const LISTING_COLUMNS: &str = "source, category, title, company, location, salary, url, description,
     detailed_salary, job_type, detailed_location, date_posted, date_scraped";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            HarvestError::Persistence(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn listing_from_row(row: &Row<'_>) -> rusqlite::Result<JobListing> {
        let source: String = row.get(0)?;
        let date_scraped: String = row.get(12)?;
        Ok(JobListing {
            source: source.parse::<Source>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, e.into())
            })?,
            category: row.get(1)?,
            title: row.get(2)?,
            company: row.get(3)?,
            location: row.get(4)?,
            salary: row.get(5)?,
            url: row.get(6)?,
            description: row.get(7)?,
            detailed_salary: row.get(8)?,
            job_type: row.get(9)?,
            detailed_location: row.get(10)?,
            date_posted: row.get(11)?,
            date_scraped: NaiveDate::parse_from_str(&date_scraped, DATE_FORMAT).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(12, rusqlite::types::Type::Text, Box::new(e))
            })?,
        })
    }
}

impl Store for SqliteStore {
    fn ensure_schema(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations.to_latest(&mut conn).map_err(|e| {
            error!("Schema migration failed: {}", e);
            HarvestError::Persistence(rusqlite::Error::InvalidQuery)
        })?;

        Ok(())
    }

    fn upsert_batch(&self, listings: &[JobListing]) -> Result<usize> {
        let mut conn = self.conn()?;

        // Dropping the transaction without commit rolls the whole batch back
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO jobs ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                LISTING_COLUMNS
            ))?;

            for listing in listings {
                stmt.execute(params![
                    listing.source.as_str(),
                    listing.category,
                    listing.title,
                    listing.company,
                    listing.location,
                    listing.salary,
                    listing.url,
                    listing.description,
                    listing.detailed_salary,
                    listing.job_type,
                    listing.detailed_location,
                    listing.date_posted,
                    listing.date_scraped.format(DATE_FORMAT).to_string(),
                ])?;
            }
        }
        tx.commit()?;

        debug!("Upserted {} listings", listings.len());
        Ok(listings.len())
    }

    fn get_by_url(&self, url: &str) -> Result<Option<JobListing>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                &format!("SELECT {} FROM jobs WHERE url = ?1", LISTING_COLUMNS),
                params![url],
                Self::listing_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn all_listings(&self) -> Result<Vec<JobListing>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!("SELECT {} FROM jobs ORDER BY id", LISTING_COLUMNS))?;
        let listings = stmt
            .query_map([], Self::listing_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(listings)
    }

    fn count(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM jobs", [], |row| row.get(0))?;
        Ok(count)
    }

    fn count_by_source(&self) -> Result<Vec<(Source, i64)>> {
        let conn = self.conn()?;

        let mut stmt =
            conn.prepare("SELECT source, COUNT(*) FROM jobs GROUP BY source ORDER BY source")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut counts = Vec::with_capacity(rows.len());
        for (source, count) in rows {
            match source.parse::<Source>() {
                Ok(source) => counts.push((source, count)),
                Err(e) => error!("Ignoring {} rows: {}", count, e),
            }
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::listing::{DESCRIPTION_PENDING, SALARY_NOT_PROVIDED};

    fn listing(source: Source, url: &str, title: &str) -> JobListing {
        let mut listing = JobListing::new(source, url, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        listing.title = title.to_string();
        listing.category = Some("Data Scientist".to_string());
        listing
    }

    #[test]
    fn test_upsert_and_get_by_url() {
        let store = SqliteStore::in_memory().unwrap();
        let job = listing(Source::Indeed, "https://uk.indeed.com/viewjob?jk=a1", "Data Scientist");

        assert_eq!(store.upsert_batch(&[job.clone()]).unwrap(), 1);

        let stored = store.get_by_url(&job.url).unwrap().unwrap();
        assert_eq!(stored, job);
        assert_eq!(stored.salary, SALARY_NOT_PROVIDED);
        assert_eq!(stored.description, DESCRIPTION_PENDING);
    }

    #[test]
    fn test_second_upsert_replaces_whole_row() {
        let store = SqliteStore::in_memory().unwrap();
        let url = "https://uk.linkedin.com/jobs/view/111";
        let first = listing(Source::LinkedIn, url, "Data Scientist");
        let mut second = listing(Source::LinkedIn, url, "Senior Data Scientist");
        second.category = None;

        store.upsert_batch(&[first]).unwrap();
        store.upsert_batch(&[second.clone()]).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let stored = store.get_by_url(url).unwrap().unwrap();
        assert_eq!(stored.title, "Senior Data Scientist");
        assert_eq!(stored.category, None);
    }

    #[test]
    fn test_invalid_record_rolls_back_batch() {
        let store = SqliteStore::in_memory().unwrap();
        let good = listing(Source::Indeed, "https://uk.indeed.com/viewjob?jk=a1", "Good");
        let bad = listing(Source::Indeed, "", "No URL");

        let result = store.upsert_batch(&[good.clone(), bad]);

        assert!(matches!(result, Err(HarvestError::Persistence(_))));
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.get_by_url(&good.url).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_url_within_batch_keeps_last() {
        let store = SqliteStore::in_memory().unwrap();
        let url = "https://uk.indeed.com/viewjob?jk=a1";

        store
            .upsert_batch(&[listing(Source::Indeed, url, "First"), listing(Source::Indeed, url, "Second")])
            .unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get_by_url(url).unwrap().unwrap().title, "Second");
    }

    #[test]
    fn test_count_by_source() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .upsert_batch(&[
                listing(Source::Indeed, "https://uk.indeed.com/viewjob?jk=1", "A"),
                listing(Source::Indeed, "https://uk.indeed.com/viewjob?jk=2", "B"),
                listing(Source::LinkedIn, "https://uk.linkedin.com/jobs/view/3", "C"),
            ])
            .unwrap();

        assert_eq!(
            store.count_by_source().unwrap(),
            vec![(Source::Indeed, 2), (Source::LinkedIn, 1)]
        );
        assert_eq!(store.all_listings().unwrap().len(), 3);
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        store.ensure_schema().unwrap();
        store.ensure_schema().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_file_backed_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job_listings.db");
        let job = listing(Source::Indeed, "https://uk.indeed.com/viewjob?jk=a1", "Energy Analyst");

        {
            let store = SqliteStore::new(&path).unwrap();
            store.upsert_batch(&[job.clone()]).unwrap();
        }

        let reopened = SqliteStore::new(&path).unwrap();
        assert_eq!(reopened.all_listings().unwrap(), vec![job]);
    }
}
