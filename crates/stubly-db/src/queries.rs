use crate::Database;
use crate::models::{
    EventRow, GuestRow, NewEvent, NewGuest, NewTicket, NotificationRow, TicketRow, UserRow,
};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

/// Which notification table a query targets. Regular and manager sign-ins
/// land in separate tables with an identical shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    User,
    Manager,
}

impl NotificationKind {
    fn table(self) -> &'static str {
        match self {
            NotificationKind::User => "Notification",
            NotificationKind::Manager => "ManagerNotification",
        }
    }
}

const EVENT_COLUMNS: &str = "id, title, date, startTime, endTime, creator, address, landmark, \
     state, city, postcode, tags, description, categories, bankName, accountNumber, eventImage, \
     createdAt, updatedAt";

const USER_COLUMNS: &str = "id, firstName, lastName, email, password, createdAt, updatedAt";

const NOTIFICATION_COLUMNS: &str = "id, userEmail, title, message, read, createdAt, updatedAt";

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<UserRow> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO User (firstName, lastName, email, password) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![first_name, last_name, email, password_hash],
            )?;
            let id = conn.last_insert_rowid();
            query_user_by_id(conn, id)?.ok_or_else(|| anyhow!("User {} missing after insert", id))
        })
    }

    /// Lookup is case-insensitive: the email column carries NOCASE collation
    /// to match the collation of the MySQL schema this replaced.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_email(conn, email))
    }

    // -- Events --

    /// Create one event plus its guests and tickets in a single transaction.
    /// An error on any insert rolls the whole batch back, so a partially
    /// created event is never visible to readers.
    pub fn create_event(
        &self,
        event: &NewEvent,
        guests: &[NewGuest],
        tickets: &[NewTicket],
    ) -> Result<EventRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO EventDetails (title, date, startTime, endTime, creator, address, \
                 landmark, state, city, postcode, tags, description, categories, bankName, \
                 accountNumber, eventImage) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                rusqlite::params![
                    event.title,
                    event.date,
                    event.start_time,
                    event.end_time,
                    event.creator,
                    event.address,
                    event.landmark,
                    event.state,
                    event.city,
                    event.postcode,
                    event.tags,
                    event.description,
                    event.categories,
                    event.bank_name,
                    event.account_number,
                    event.event_image,
                ],
            )?;
            let event_id = tx.last_insert_rowid();

            for guest in guests {
                tx.execute(
                    "INSERT INTO GuestDetails (eventId, name, title, photo) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![event_id, guest.name, guest.title, guest.photo],
                )?;
            }

            for ticket in tickets {
                tx.execute(
                    "INSERT INTO TicketDetails (eventId, name, currency, price, quantity) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        event_id,
                        ticket.name,
                        ticket.currency,
                        ticket.price,
                        ticket.quantity
                    ],
                )?;
            }

            let row = query_event_by_id(&tx, event_id)?
                .ok_or_else(|| anyhow!("Event {} missing inside its own transaction", event_id))?;

            tx.commit()?;
            Ok(row)
        })
    }

    pub fn event_by_id(&self, id: i64) -> Result<Option<EventRow>> {
        self.with_conn(|conn| query_event_by_id(conn, id))
    }

    pub fn events_by_creator(&self, creator: &str) -> Result<Vec<EventRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM EventDetails WHERE creator = ?1 ORDER BY id"
            ))?;
            let rows = stmt
                .query_map([creator], event_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_events(&self, category: Option<&str>) -> Result<Vec<EventRow>> {
        self.with_conn(|conn| match category {
            Some(category) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {EVENT_COLUMNS} FROM EventDetails WHERE categories = ?1 ORDER BY id"
                ))?;
                let rows = stmt
                    .query_map([category], event_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            }
            None => {
                let mut stmt = conn
                    .prepare(&format!("SELECT {EVENT_COLUMNS} FROM EventDetails ORDER BY id"))?;
                let rows = stmt
                    .query_map([], event_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            }
        })
    }

    pub fn guests_for_event(&self, event_id: i64) -> Result<Vec<GuestRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, eventId, name, title, photo, createdAt, updatedAt \
                 FROM GuestDetails WHERE eventId = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([event_id], |row| {
                    Ok(GuestRow {
                        id: row.get(0)?,
                        event_id: row.get(1)?,
                        name: row.get(2)?,
                        title: row.get(3)?,
                        photo: row.get(4)?,
                        created_at: row.get(5)?,
                        updated_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn tickets_for_event(&self, event_id: i64) -> Result<Vec<TicketRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, eventId, name, currency, price, quantity, createdAt, updatedAt \
                 FROM TicketDetails WHERE eventId = ?1 ORDER BY id",
            )?;
            let rows = stmt
                .query_map([event_id], |row| {
                    Ok(TicketRow {
                        id: row.get(0)?,
                        event_id: row.get(1)?,
                        name: row.get(2)?,
                        currency: row.get(3)?,
                        price: row.get(4)?,
                        quantity: row.get(5)?,
                        created_at: row.get(6)?,
                        updated_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Notifications --

    pub fn insert_notification(
        &self,
        kind: NotificationKind,
        id: &str,
        user_email: &str,
        title: &str,
        message: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                &format!(
                    "INSERT INTO {} (id, userEmail, title, message) VALUES (?1, ?2, ?3, ?4)",
                    kind.table()
                ),
                rusqlite::params![id, user_email, title, message],
            )?;
            Ok(())
        })
    }

    pub fn unread_notifications(
        &self,
        kind: NotificationKind,
        email: &str,
    ) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM {} WHERE userEmail = ?1 AND read = 0 \
                 ORDER BY createdAt DESC, rowid DESC",
                kind.table()
            ))?;
            let rows = stmt
                .query_map([email], notification_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn all_notifications(
        &self,
        kind: NotificationKind,
        email: &str,
    ) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS} FROM {} WHERE userEmail = ?1 \
                 ORDER BY createdAt DESC, rowid DESC",
                kind.table()
            ))?;
            let rows = stmt
                .query_map([email], notification_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch mark-read over an IN clause; ids outside the table are ignored.
    /// Returns the number of rows updated.
    pub fn mark_notifications_read(
        &self,
        kind: NotificationKind,
        ids: &[String],
    ) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        self.with_conn_mut(|conn| {
            let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "UPDATE {} SET read = 1, updatedAt = datetime('now') WHERE id IN ({})",
                kind.table(),
                placeholders.join(", ")
            );

            let params: Vec<&dyn rusqlite::types::ToSql> =
                ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();

            let updated = conn.execute(&sql, params.as_slice())?;
            Ok(updated)
        })
    }
}

fn event_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get(0)?,
        title: row.get(1)?,
        date: row.get(2)?,
        start_time: row.get(3)?,
        end_time: row.get(4)?,
        creator: row.get(5)?,
        address: row.get(6)?,
        landmark: row.get(7)?,
        state: row.get(8)?,
        city: row.get(9)?,
        postcode: row.get(10)?,
        tags: row.get(11)?,
        description: row.get(12)?,
        categories: row.get(13)?,
        bank_name: row.get(14)?,
        account_number: row.get(15)?,
        event_image: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        password: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn notification_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        user_email: row.get(1)?,
        title: row.get(2)?,
        message: row.get(3)?,
        read: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn query_event_by_id(conn: &Connection, id: i64) -> Result<Option<EventRow>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {EVENT_COLUMNS} FROM EventDetails WHERE id = ?1"))?;

    let row = stmt.query_row([id], event_from_row).optional()?;

    Ok(row)
}

fn query_user_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM User WHERE email = ?1"))?;

    let row = stmt.query_row([email], user_from_row).optional()?;

    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM User WHERE id = ?1"))?;

    let row = stmt.query_row([id], user_from_row).optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn launch_event() -> NewEvent {
        NewEvent {
            title: "Launch Party".to_string(),
            date: "2030-06-01 00:00:00".to_string(),
            start_time: "2030-06-01 18:00:00".to_string(),
            end_time: "2030-06-01 22:00:00".to_string(),
            creator: "ada@example.com".to_string(),
            address: "1 Marina Road".to_string(),
            landmark: None,
            state: "Lagos".to_string(),
            city: "Ikeja".to_string(),
            postcode: "100001".to_string(),
            tags: Some("tech,launch".to_string()),
            description: "Product launch with live demos".to_string(),
            categories: "Tech".to_string(),
            bank_name: "Access Bank".to_string(),
            account_number: "0123456789".to_string(),
            event_image: Some("photos[0]-1700000000000.jpg".to_string()),
        }
    }

    fn ga_ticket() -> NewTicket {
        NewTicket {
            name: "General Admission".to_string(),
            currency: "NGN".to_string(),
            price: 1500.0,
            quantity: 100,
        }
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.with_conn(|conn| {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?)
        })
        .unwrap()
    }

    #[test]
    fn create_event_persists_event_guests_and_tickets() {
        let db = test_db();
        let guests = vec![
            NewGuest {
                name: "Grace".to_string(),
                title: "Keynote".to_string(),
                photo: Some("guests[0][photo]-1700000000000.jpg".to_string()),
            },
            NewGuest {
                name: "Linus".to_string(),
                title: "Panelist".to_string(),
                photo: None,
            },
        ];
        let tickets = vec![
            ga_ticket(),
            NewTicket {
                name: "VIP".to_string(),
                currency: "NGN".to_string(),
                price: 5000.0,
                quantity: 20,
            },
        ];

        let event = db.create_event(&launch_event(), &guests, &tickets).unwrap();
        assert!(event.id > 0);
        assert_eq!(event.title, "Launch Party");
        assert_eq!(event.start_time, "2030-06-01 18:00:00");
        assert_eq!(event.event_image.as_deref(), Some("photos[0]-1700000000000.jpg"));

        let stored_guests = db.guests_for_event(event.id).unwrap();
        assert_eq!(stored_guests.len(), 2);
        assert!(stored_guests.iter().all(|g| g.event_id == event.id));
        assert_eq!(stored_guests[0].photo.as_deref(), Some("guests[0][photo]-1700000000000.jpg"));
        assert_eq!(stored_guests[1].photo, None);

        let stored_tickets = db.tickets_for_event(event.id).unwrap();
        assert_eq!(stored_tickets.len(), 2);
        assert!(stored_tickets.iter().all(|t| t.event_id == event.id));
        assert_eq!(stored_tickets[1].price, 5000.0);
        assert_eq!(stored_tickets[1].quantity, 20);
    }

    #[test]
    fn create_event_rolls_back_everything_when_a_ticket_insert_fails() {
        let db = test_db();
        // Sabotage the last table touched by the transaction.
        db.with_conn_mut(|conn| {
            conn.execute("DROP TABLE TicketDetails", [])?;
            Ok(())
        })
        .unwrap();

        let guests = vec![NewGuest {
            name: "Grace".to_string(),
            title: "Keynote".to_string(),
            photo: None,
        }];
        let result = db.create_event(&launch_event(), &guests, &[ga_ticket()]);

        assert!(result.is_err());
        assert_eq!(count(&db, "EventDetails"), 0);
        assert_eq!(count(&db, "GuestDetails"), 0);
    }

    #[test]
    fn create_event_accepts_an_empty_guest_list() {
        let db = test_db();
        let event = db.create_event(&launch_event(), &[], &[ga_ticket()]).unwrap();

        assert!(db.guests_for_event(event.id).unwrap().is_empty());
        assert_eq!(db.tickets_for_event(event.id).unwrap().len(), 1);
    }

    #[test]
    fn deleting_an_event_cascades_to_guests_and_tickets() {
        let db = test_db();
        let guests = vec![NewGuest {
            name: "Grace".to_string(),
            title: "Keynote".to_string(),
            photo: None,
        }];
        let event = db.create_event(&launch_event(), &guests, &[ga_ticket()]).unwrap();

        db.with_conn_mut(|conn| {
            conn.execute("DELETE FROM EventDetails WHERE id = ?1", [event.id])?;
            Ok(())
        })
        .unwrap();

        assert_eq!(count(&db, "GuestDetails"), 0);
        assert_eq!(count(&db, "TicketDetails"), 0);
    }

    #[test]
    fn create_user_rejects_duplicate_emails_case_insensitively() {
        let db = test_db();
        db.create_user("Ada", "Lovelace", "ada@example.com", "hash-1").unwrap();

        assert!(db.create_user("Grace", "Hopper", "ada@example.com", "hash-2").is_err());
        assert!(db.create_user("Grace", "Hopper", "ADA@EXAMPLE.COM", "hash-3").is_err());
    }

    #[test]
    fn find_user_by_email_ignores_case() {
        let db = test_db();
        let created = db.create_user("Ada", "Lovelace", "ada@example.com", "hash-1").unwrap();
        assert!(created.id > 0);

        let found = db.find_user_by_email("ADA@example.COM").unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.first_name, "Ada");
        assert_eq!(found.password, "hash-1");

        assert!(db.find_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn events_by_creator_and_category_filters() {
        let db = test_db();
        let mut event = launch_event();
        db.create_event(&event, &[], &[ga_ticket()]).unwrap();

        event.creator = "other@example.com".to_string();
        event.categories = "Music".to_string();
        db.create_event(&event, &[], &[ga_ticket()]).unwrap();

        assert_eq!(db.events_by_creator("ada@example.com").unwrap().len(), 1);
        assert!(db.events_by_creator("nobody@example.com").unwrap().is_empty());

        assert_eq!(db.list_events(Some("Music")).unwrap().len(), 1);
        assert!(db.list_events(Some("Opera")).unwrap().is_empty());
        assert_eq!(db.list_events(None).unwrap().len(), 2);
    }

    #[test]
    fn event_by_id_returns_none_for_missing_rows() {
        let db = test_db();
        assert!(db.event_by_id(42).unwrap().is_none());
    }

    #[test]
    fn notifications_filter_by_kind_and_unread_state() {
        let db = test_db();
        let ids = ["n-1", "n-2", "n-3"];
        for id in ids {
            db.insert_notification(NotificationKind::User, id, "ada@example.com", "Stubbly", "hello")
                .unwrap();
        }
        db.insert_notification(NotificationKind::Manager, "m-1", "ada@example.com", "Stubbly", "hi")
            .unwrap();

        assert_eq!(db.unread_notifications(NotificationKind::User, "ada@example.com").unwrap().len(), 3);
        assert_eq!(db.unread_notifications(NotificationKind::Manager, "ada@example.com").unwrap().len(), 1);
        assert!(db.unread_notifications(NotificationKind::User, "other@example.com").unwrap().is_empty());

        let newest_first = db.all_notifications(NotificationKind::User, "ada@example.com").unwrap();
        assert_eq!(newest_first[0].id, "n-3");
        assert_eq!(newest_first[2].id, "n-1");
    }

    #[test]
    fn mark_notifications_read_only_touches_the_given_ids() {
        let db = test_db();
        for id in ["n-1", "n-2", "n-3"] {
            db.insert_notification(NotificationKind::User, id, "ada@example.com", "Stubbly", "hello")
                .unwrap();
        }

        let updated = db
            .mark_notifications_read(
                NotificationKind::User,
                &["n-1".to_string(), "n-3".to_string(), "n-404".to_string()],
            )
            .unwrap();
        assert_eq!(updated, 2);

        let unread = db.unread_notifications(NotificationKind::User, "ada@example.com").unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, "n-2");

        // Everything is still visible to the history endpoint.
        assert_eq!(db.all_notifications(NotificationKind::User, "ada@example.com").unwrap().len(), 3);
    }

    #[test]
    fn mark_notifications_read_with_no_ids_is_a_noop() {
        let db = test_db();
        assert_eq!(db.mark_notifications_read(NotificationKind::User, &[]).unwrap(), 0);
    }
}
