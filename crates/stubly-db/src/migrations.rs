use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Table and column names keep the camelCase spelling of the hosted MySQL
/// schema this service replaced, so existing clients see identical JSON.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS EventDetails (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            title         TEXT NOT NULL,
            date          TEXT NOT NULL,
            startTime     TEXT NOT NULL,
            endTime       TEXT NOT NULL,
            creator       TEXT NOT NULL,
            address       TEXT NOT NULL,
            landmark      TEXT,
            state         TEXT NOT NULL,
            city          TEXT NOT NULL,
            postcode      TEXT NOT NULL,
            tags          TEXT,
            description   TEXT NOT NULL,
            categories    TEXT NOT NULL,
            bankName      TEXT NOT NULL,
            accountNumber TEXT NOT NULL,
            eventImage    TEXT,
            createdAt     TEXT NOT NULL DEFAULT (datetime('now')),
            updatedAt     TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_events_creator
            ON EventDetails(creator);

        CREATE TABLE IF NOT EXISTS GuestDetails (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            eventId     INTEGER NOT NULL REFERENCES EventDetails(id)
                            ON DELETE CASCADE ON UPDATE CASCADE,
            name        TEXT NOT NULL,
            title       TEXT NOT NULL,
            photo       TEXT,
            createdAt   TEXT NOT NULL DEFAULT (datetime('now')),
            updatedAt   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_guests_event
            ON GuestDetails(eventId);

        CREATE TABLE IF NOT EXISTS TicketDetails (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            eventId     INTEGER NOT NULL REFERENCES EventDetails(id)
                            ON DELETE CASCADE ON UPDATE CASCADE,
            name        TEXT NOT NULL,
            currency    TEXT NOT NULL,
            price       REAL NOT NULL,
            quantity    INTEGER NOT NULL,
            createdAt   TEXT NOT NULL DEFAULT (datetime('now')),
            updatedAt   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_tickets_event
            ON TicketDetails(eventId);

        CREATE TABLE IF NOT EXISTS User (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            firstName   TEXT NOT NULL,
            lastName    TEXT NOT NULL,
            email       TEXT NOT NULL COLLATE NOCASE UNIQUE,
            password    TEXT NOT NULL,
            createdAt   TEXT NOT NULL DEFAULT (datetime('now')),
            updatedAt   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS Notification (
            id          TEXT PRIMARY KEY,
            userEmail   TEXT NOT NULL,
            title       TEXT NOT NULL,
            message     TEXT NOT NULL,
            read        INTEGER NOT NULL DEFAULT 0,
            createdAt   TEXT NOT NULL DEFAULT (datetime('now')),
            updatedAt   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user
            ON Notification(userEmail, read);

        CREATE TABLE IF NOT EXISTS ManagerNotification (
            id          TEXT PRIMARY KEY,
            userEmail   TEXT NOT NULL,
            title       TEXT NOT NULL,
            message     TEXT NOT NULL,
            read        INTEGER NOT NULL DEFAULT 0,
            createdAt   TEXT NOT NULL DEFAULT (datetime('now')),
            updatedAt   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_manager_notifications_user
            ON ManagerNotification(userEmail, read);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
