//! Read-only hiring reports over the ingested tables.
//!
//! Hires without a parseable timestamp are stored with a NULL `hired_at` and fall outside every
//! year filter.

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::error::Result;

/// Hires per quarter for one department/job pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuarterlyHires {
    pub department: String,
    pub job: String,
    pub q1: i64,
    pub q2: i64,
    pub q3: i64,
    pub q4: i64,
}

/// A department's hire count for a year
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentHires {
    pub id: i64,
    pub department: String,
    pub hired: i64,
}

fn year_param(year: i32) -> String {
    format!("{:04}", year)
}

/// Hires in `year` per department and job, split by quarter.
pub fn hires_by_quarter(conn: &Connection, year: i32) -> Result<Vec<QuarterlyHires>> {
    let mut stmt = conn.prepare_cached(
        r#"
        SELECT d.department, j.job,
            SUM(CASE WHEN e.quarter = 1 THEN 1 ELSE 0 END) AS q1,
            SUM(CASE WHEN e.quarter = 2 THEN 1 ELSE 0 END) AS q2,
            SUM(CASE WHEN e.quarter = 3 THEN 1 ELSE 0 END) AS q3,
            SUM(CASE WHEN e.quarter = 4 THEN 1 ELSE 0 END) AS q4
        FROM (
            SELECT department_id, job_id,
                (CAST(strftime('%m', hired_at) AS INTEGER) + 2) / 3 AS quarter
            FROM employees
            WHERE strftime('%Y', hired_at) = ?1
        ) e
        JOIN departments d ON e.department_id = d.id
        JOIN jobs j ON e.job_id = j.id
        GROUP BY d.department, j.job
        ORDER BY d.department, j.job
        "#,
    )?;

    let rows = stmt.query_map(params![year_param(year)], |row| {
        Ok(QuarterlyHires {
            department: row.get(0)?,
            job: row.get(1)?,
            q1: row.get(2)?,
            q2: row.get(3)?,
            q3: row.get(4)?,
            q4: row.get(5)?,
        })
    })?;

    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Departments that hired more than the mean across departments that hired in `year`.
/// The mean counts departments by name, so ids sharing a name are averaged as one.
pub fn departments_above_mean(conn: &Connection, year: i32) -> Result<Vec<DepartmentHires>> {
    let mut stmt = conn.prepare_cached(
        r#"
        WITH year_hires AS (
            SELECT d.id, d.department
            FROM employees e
            JOIN departments d ON e.department_id = d.id
            WHERE strftime('%Y', e.hired_at) = ?1
        ),
        per_name AS (
            SELECT department, COUNT(*) AS hired
            FROM year_hires
            GROUP BY department
        ),
        per_id AS (
            SELECT id, department, COUNT(*) AS hired
            FROM year_hires
            GROUP BY id, department
        )
        SELECT id, department, hired
        FROM per_id
        WHERE hired > (SELECT AVG(hired) FROM per_name)
        ORDER BY hired DESC, id
        "#,
    )?;

    let rows = stmt.query_map(params![year_param(year)], |row| {
        Ok(DepartmentHires {
            id: row.get(0)?,
            department: row.get(1)?,
            hired: row.get(2)?,
        })
    })?;

    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}
