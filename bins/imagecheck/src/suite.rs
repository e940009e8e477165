// Extension verification suite
use crate::config::DatabaseConfig;
use imagecheck_common::types::{Expectation, TestCase};

fn psql(db: &DatabaseConfig, sql: &str) -> String {
    format!("psql -U {} -d {} -t -A -c \"{}\"", db.user, db.name, sql)
}

/// Build the static list of verification cases
///
/// Cases marked `extended_only` need packages that only the extended image
/// ships and are filtered out before execution for baseline images.
pub fn build_test_suite(db: &DatabaseConfig) -> Vec<TestCase> {
    vec![
        // Basic PostgreSQL functionality
        TestCase::new("PostgreSQL accepts connections", psql(db, "SELECT 1"), Expectation::exact("1")),
        TestCase::new("PostgreSQL version check", psql(db, "SHOW server_version"), Expectation::NonEmpty),
        // Spock
        TestCase::new(
            "Spock extension can be created",
            psql(db, "CREATE EXTENSION IF NOT EXISTS spock; SELECT 1;"),
            Expectation::Succeeds,
        ),
        TestCase::new(
            "Spock subscription table accessible",
            psql(db, "SELECT count(*) FROM spock.subscription;"),
            Expectation::exact("0"),
        ),
        // LOLOR
        TestCase::new(
            "LOLOR extension can be created",
            psql(db, "CREATE EXTENSION IF NOT EXISTS lolor; SELECT 1;"),
            Expectation::Succeeds,
        ),
        TestCase::new(
            "LOLOR lo_create works",
            psql(db, "SELECT lo_create(200000);"),
            Expectation::exact("200000"),
        ),
        // Snowflake
        TestCase::new(
            "Snowflake extension can be created",
            psql(db, "CREATE EXTENSION IF NOT EXISTS snowflake; SELECT 1;"),
            Expectation::Succeeds,
        ),
        TestCase::new(
            "Snowflake ID generation works",
            psql(db, "SELECT snowflake.nextval() > 0;"),
            Expectation::exact("t"),
        ),
        // pgvector
        TestCase::new(
            "pgvector extension can be created",
            psql(db, "CREATE EXTENSION IF NOT EXISTS vector; SELECT 1;"),
            Expectation::Succeeds,
        )
        .extended_only(),
        TestCase::new(
            "pgvector distance calculation works",
            psql(db, "SELECT '[1,2,3]'::vector <-> '[4,5,6]'::vector;"),
            // 5.196152422706632
            Expectation::prefix("5.196"),
        )
        .extended_only(),
        // PostGIS
        TestCase::new(
            "PostGIS extension can be created",
            psql(db, "CREATE EXTENSION IF NOT EXISTS postgis; SELECT 1;"),
            Expectation::Succeeds,
        )
        .extended_only(),
        TestCase::new(
            "PostGIS ST_Distance works",
            psql(db, "SELECT ST_Distance(ST_Point(1, 1), ST_Point(4, 5));"),
            Expectation::exact("5"),
        )
        .extended_only(),
        // pgaudit
        TestCase::new(
            "pgaudit extension can be created",
            psql(db, "CREATE EXTENSION IF NOT EXISTS pgaudit; SELECT 1;"),
            Expectation::Succeeds,
        )
        .extended_only(),
        // pgBackRest
        TestCase::new("pgBackRest is installed", "pgbackrest version", Expectation::contains("pgBackRest"))
            .extended_only(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use imagecheck_common::command::tokenize;
    use imagecheck_common::types::Variant;
    use std::collections::HashSet;

    #[test]
    fn test_case_names_are_unique() {
        let suite = build_test_suite(&DatabaseConfig::default());
        let names: HashSet<_> = suite.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), suite.len());
    }

    #[test]
    fn test_partition_by_variant() {
        let suite = build_test_suite(&DatabaseConfig::default());
        let baseline = suite.iter().filter(|c| c.applies_to(Variant::Baseline)).count();
        let extended = suite.iter().filter(|c| c.applies_to(Variant::Extended)).count();

        assert_eq!(baseline, 8);
        assert_eq!(extended, suite.len());
    }

    #[test]
    fn test_sql_stays_one_argument() {
        let suite = build_test_suite(&DatabaseConfig::default());
        let distance = suite
            .iter()
            .find(|c| c.name == "pgvector distance calculation works")
            .unwrap();

        let argv = tokenize(&distance.invocation);
        assert_eq!(argv[0], "psql");
        assert_eq!(argv.last().unwrap(), "SELECT '[1,2,3]'::vector <-> '[4,5,6]'::vector;");
        assert_eq!(argv.len(), 9);
    }
}
