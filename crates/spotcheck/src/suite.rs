//! The SpotifyClone challenge checks.
//!
//! Structural checks look at the normalized tables through the role mapping.
//! Query checks run one analytical script each and compare the view it
//! creates. Checks run one after the other on the same connection.

use camino::{Utf8Path, Utf8PathBuf};
use spotcheck_config::Config;

use crate::catalog::Verifier;
use crate::compare::{diff_rows, missing_columns};
use crate::db::Database;
use crate::record;
use crate::report::{CheckOutcome, Report};
use crate::roles::{Role, RoleMapping};
use crate::traced::Connection;
use crate::value::Record;
use crate::{Error, Result};

/// A normalization check on one role's table.
#[derive(Debug, Clone, Copy)]
pub struct StructuralCheck {
    pub name: &'static str,
    /// Role whose table is checked.
    pub subject: Role,
    /// Roles that must map to a different table than `subject`.
    pub distinct_from: &'static [Role],
    pub rows: i64,
    /// `(from, to)`: the table of `from` must reference the primary key of
    /// the table of `to` through exactly one column.
    pub foreign_keys: &'static [(Role, Role)],
    pub composite_key: bool,
}

pub const STRUCTURAL_CHECKS: [StructuralCheck; 3] = [
    StructuralCheck {
        name: "plans",
        subject: Role::Plan,
        distinct_from: &[Role::User],
        rows: 3,
        foreign_keys: &[(Role::User, Role::Plan)],
        composite_key: false,
    },
    StructuralCheck {
        name: "reproduction history",
        subject: Role::ReproductionHistory,
        distinct_from: &[Role::User, Role::Song],
        rows: 14,
        foreign_keys: &[
            (Role::ReproductionHistory, Role::Song),
            (Role::ReproductionHistory, Role::User),
        ],
        composite_key: true,
    },
    StructuralCheck {
        name: "following artists",
        subject: Role::FollowingArtist,
        distinct_from: &[Role::User, Role::Artist],
        rows: 8,
        foreign_keys: &[
            (Role::FollowingArtist, Role::Artist),
            (Role::FollowingArtist, Role::User),
        ],
        composite_key: true,
    },
];

/// What a query check compares the view against.
#[derive(Debug, Clone, Copy)]
pub enum Expected {
    /// Exact rows, in order.
    Rows(fn() -> Vec<Record>),
    /// Only the number of rows.
    RowCount(usize),
    /// Only the column shape.
    Shape,
}

/// An analytical script and the view it must create.
#[derive(Debug, Clone, Copy)]
pub struct QueryCheck {
    pub name: &'static str,
    /// Script file name, relative to the submission directory.
    pub script: &'static str,
    pub view: &'static str,
    pub columns: &'static [&'static str],
    pub expected: Expected,
}

pub const QUERY_CHECKS: [QueryCheck; 4] = [
    QueryCheck {
        name: "musical statistics",
        script: "desafio2.sql",
        view: "estatisticas_musicais",
        columns: &["cancoes", "artistas", "albuns"],
        expected: Expected::Rows(musical_statistics),
    },
    QueryCheck {
        name: "user reproduction history",
        script: "desafio3.sql",
        view: "historico_reproducao_usuarios",
        columns: &["usuario", "nome"],
        expected: Expected::Shape,
    },
    QueryCheck {
        name: "top 3 artists",
        script: "desafio4.sql",
        view: "top_3_artistas",
        columns: &["artista", "seguidores"],
        expected: Expected::Rows(top_3_artists),
    },
    QueryCheck {
        name: "top 2 hits",
        script: "desafio5.sql",
        view: "top_2_hits_do_momento",
        columns: &["cancao", "reproducoes"],
        expected: Expected::RowCount(2),
    },
];

pub fn musical_statistics() -> Vec<Record> {
    vec![record! { "cancoes" => 18, "artistas" => 4, "albuns" => 5 }]
}

pub fn top_3_artists() -> Vec<Record> {
    vec![
        record! { "artista" => "Walter Phoenix", "seguidores" => 3 },
        record! { "artista" => "Freedie Shannon", "seguidores" => 2 },
        record! { "artista" => "Lance Day", "seguidores" => 2 },
    ]
}

/// Run a structural check. Database errors fail the check.
pub async fn run_structural<C: Connection>(
    verifier: &Verifier<'_, C>,
    roles: &RoleMapping,
    check: &StructuralCheck,
) -> CheckOutcome {
    let mut outcome = CheckOutcome::new(check.name);
    tracing::info!(check = check.name, "running structural check");
    if let Err(e) = structural(verifier, roles, check, &mut outcome).await {
        outcome.fail(e.to_string());
    }
    log_outcome(&outcome);
    outcome
}

async fn structural<C: Connection>(
    verifier: &Verifier<'_, C>,
    roles: &RoleMapping,
    check: &StructuralCheck,
    outcome: &mut CheckOutcome,
) -> Result<()> {
    let Some(table) = roles.table(check.subject) else {
        outcome.fail(format!("role {} is not mapped", check.subject));
        return Ok(());
    };

    for other in check.distinct_from {
        if let Some(other_table) = roles.table(*other)
            && other_table == table
        {
            outcome.fail(format!(
                "{} and {} both map to table {table:?}",
                check.subject, other
            ));
        }
    }

    let rows = verifier.count_rows(table).await?;
    if rows != check.rows {
        outcome.fail(format!("{table} has {rows} row(s), expected {}", check.rows));
    }

    for &(from, to) in check.foreign_keys {
        let (Some(from_table), Some(to_table)) = (roles.table(from), roles.table(to)) else {
            outcome.fail(format!("cannot check {from} -> {to}: role is not mapped"));
            continue;
        };
        let mut columns = verifier.foreign_key_columns(from_table, to_table).await?;
        match columns.len() {
            1 => {}
            0 => outcome.fail(format!(
                "{from_table} has no foreign key referencing the primary key of {to_table}"
            )),
            n => {
                // redundant constraints on one column come back once per constraint
                columns.dedup();
                outcome.fail(format!(
                    "{from_table} references the primary key of {to_table} {n} times ({}), expected exactly one",
                    columns.join(", ")
                ));
            }
        }
    }

    if check.composite_key {
        let key = verifier.primary_key_columns(table).await?;
        if key.len() <= 1 {
            outcome.fail(format!(
                "primary key of {table} is not composite: [{}]",
                key.join(", ")
            ));
        }
    }

    Ok(())
}

/// Run an analytical script from `dir` and compare its view.
pub async fn run_query<C: Connection>(
    verifier: &Verifier<'_, C>,
    dir: &Utf8Path,
    check: &QueryCheck,
) -> CheckOutcome {
    let mut outcome = CheckOutcome::new(check.name);
    tracing::info!(check = check.name, script = check.script, "running query check");
    if let Err(e) = query(verifier, dir, check, &mut outcome).await {
        outcome.fail(e.to_string());
    }
    log_outcome(&outcome);
    outcome
}

async fn query<C: Connection>(
    verifier: &Verifier<'_, C>,
    dir: &Utf8Path,
    check: &QueryCheck,
    outcome: &mut CheckOutcome,
) -> Result<()> {
    let path = dir.join(check.script);
    let sql = std::fs::read_to_string(&path).map_err(|e| Error::io(path, e))?;
    verifier.run_script(&sql).await?;

    let columns = verifier.columns(check.view).await?;
    let missing = missing_columns(check.columns, &columns);
    if !missing.is_empty() {
        outcome.fail(format!(
            "{} is missing column(s) {}; has [{}]",
            check.view,
            missing.join(", "),
            columns.join(", ")
        ));
        return Ok(());
    }

    let rows = verifier.fetch_rows(check.view).await?;
    match check.expected {
        Expected::Rows(fixture) => {
            for mismatch in diff_rows(&fixture(), &rows) {
                outcome.fail(format!("{}: {mismatch}", check.view));
            }
        }
        Expected::RowCount(count) => {
            if rows.len() != count {
                outcome.fail(format!(
                    "{} has {} row(s), expected {count}",
                    check.view,
                    rows.len()
                ));
            }
        }
        Expected::Shape => {}
    }
    Ok(())
}

fn log_outcome(outcome: &CheckOutcome) {
    if outcome.passed() {
        tracing::info!(check = %outcome.name, "passed");
    } else {
        for failure in &outcome.failures {
            tracing::warn!(check = %outcome.name, "{failure}");
        }
    }
}

/// Run every check against an already imported schema.
pub async fn run_checks(db: &Database, dir: &Utf8Path, roles: &RoleMapping) -> Report {
    let verifier = db.verifier();
    let mut report = Report::default();
    for check in &STRUCTURAL_CHECKS {
        report.push(run_structural(&verifier, roles, check).await);
    }
    for check in &QUERY_CHECKS {
        report.push(run_query(&verifier, dir, check).await);
    }
    report
}

/// Paths of the submission files named by `config`.
pub struct Submission {
    pub dir: Utf8PathBuf,
    pub dump: Utf8PathBuf,
    pub roles: Utf8PathBuf,
}

impl Submission {
    pub fn from_config(config: &Config) -> Self {
        let dir = Utf8PathBuf::from(config.submission.dir());
        Self {
            dump: dir.join(config.submission.dump()),
            roles: dir.join(config.submission.roles()),
            dir,
        }
    }
}

/// A whole grading run: connect, import, check, tear down.
///
/// Connection, import and mapping errors abort the run. Everything after that
/// ends up in the report; a failed teardown is only logged.
pub async fn grade(config: &Config) -> Result<Report> {
    let submission = Submission::from_config(config);
    let roles = RoleMapping::load(&submission.roles)?;
    for role in roles.unmapped() {
        tracing::warn!(%role, "role is not mapped");
    }

    let db = Database::connect(&config.database).await?;
    let prepared = async {
        db.reset_schema().await?;
        db.import(&submission.dump).await
    }
    .await;
    if let Err(e) = prepared {
        if let Err(teardown) = db.teardown().await {
            tracing::warn!("teardown after failed import: {teardown}");
        }
        return Err(e);
    }

    let report = run_checks(&db, &submission.dir, &roles).await;
    if let Err(e) = db.teardown().await {
        tracing::warn!("teardown after checks: {e}");
    }
    Ok(report)
}
