//! Schema (spec §6): projects, plans, tasks, task_deps, prs, slots, with
//! the required indexes for the worktree-pool variant (§3 resolution).

use rusqlite::Connection;

use crate::error::Result;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            repo_root TEXT NOT NULL UNIQUE,
            remote_url TEXT,
            main_branch TEXT NOT NULL DEFAULT 'main',
            max_concurrency INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS plans (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            source_branch TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'draft'
                CHECK (status IN ('draft', 'planning', 'ready', 'in_progress', 'completed', 'archived')),
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS slots (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            path TEXT NOT NULL,
            branch TEXT,
            status TEXT NOT NULL DEFAULT 'available'
                CHECK (status IN ('available', 'assigned', 'in_progress', 'pr_pending', 'completed', 'error')),
            task_id TEXT REFERENCES tasks(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            plan_id TEXT NOT NULL REFERENCES plans(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'ready', 'assigned', 'in_progress', 'pr_created', 'in_review', 'completed', 'blocked')),
            level INTEGER NOT NULL DEFAULT 0,
            estimated_lines INTEGER,
            branch_name TEXT,
            slot_id TEXT REFERENCES slots(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS task_deps (
            task_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            depends_on_id TEXT NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
            PRIMARY KEY (task_id, depends_on_id),
            CHECK (task_id != depends_on_id)
        );

        CREATE TABLE IF NOT EXISTS prs (
            id TEXT PRIMARY KEY,
            task_id TEXT NOT NULL UNIQUE REFERENCES tasks(id) ON DELETE CASCADE,
            number INTEGER NOT NULL,
            url TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'draft'
                CHECK (status IN ('draft', 'open', 'in_review', 'approved', 'merged', 'closed')),
            base_branch TEXT NOT NULL,
            head_branch TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_plans_project ON plans(project_id);
        CREATE INDEX IF NOT EXISTS idx_slots_project ON slots(project_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_plan ON tasks(plan_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_plan_status ON tasks(plan_id, status);
        CREATE INDEX IF NOT EXISTS idx_tasks_branch_name ON tasks(branch_name);
        CREATE INDEX IF NOT EXISTS idx_deps_task ON task_deps(task_id);
        CREATE INDEX IF NOT EXISTS idx_deps_depends_on ON task_deps(depends_on_id);
        CREATE INDEX IF NOT EXISTS idx_prs_task ON prs(task_id);
        ",
    )?;
    Ok(())
}
