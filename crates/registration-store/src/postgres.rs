use async_trait::async_trait;
use domain::{
    Contact, Decision, Event, PartySize, Registration, apply_cancellation, cancellation_delta,
    evaluate,
};
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow};
use uuid::Uuid;

use crate::{
    EventId, RegistrationId, Result, StoreError,
    store::{
        AdmissionOutcome, CancellationOutcome, CancelledRegistration, EventSnapshot,
        RegistrationStore,
    },
};

const EVENT_COLUMNS: &str = "id, title, capacity, current_attendees, created_at";
const REGISTRATION_COLUMNS: &str = "id, event_id, party_size, contact, created_at";

/// PostgreSQL-backed registration store.
///
/// Creates lock the event row with `SELECT ... FOR UPDATE` for the whole
/// transaction, which serializes capacity checks per event. Cancels delete
/// the registration first and then lock the event row, so the two
/// operations always acquire locks in a compatible order.
#[derive(Clone)]
pub struct PostgresRegistrationStore {
    pool: PgPool,
}

impl PostgresRegistrationStore {
    /// Creates a new PostgreSQL registration store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool to `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_event(row: &PgRow) -> Result<Event> {
        let capacity: Option<i64> = row.try_get("capacity")?;
        let current_attendees: i64 = row.try_get("current_attendees")?;

        Ok(Event {
            id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
            title: row.try_get("title")?,
            capacity: capacity.map(|c| to_count("capacity", c)).transpose()?,
            current_attendees: to_count("current_attendees", current_attendees)?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_registration(row: &PgRow) -> Result<Registration> {
        let party_size: i64 = row.try_get("party_size")?;
        let contact: serde_json::Value = row.try_get("contact")?;

        Ok(Registration {
            id: RegistrationId::from_uuid(row.try_get::<Uuid, _>("id")?),
            event_id: EventId::from_uuid(row.try_get::<Uuid, _>("event_id")?),
            party_size: to_party_size(party_size)?,
            contact: serde_json::from_value(contact)?,
            created_at: row.try_get("created_at")?,
        })
    }
}

fn to_count(column: &str, value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("{column} out of range: {value}")))
}

fn to_party_size(value: i64) -> Result<PartySize> {
    PartySize::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("party_size out of range: {value}")))
}

#[async_trait]
impl RegistrationStore for PostgresRegistrationStore {
    async fn insert_event(&self, mut event: Event) -> Result<Event> {
        event.current_attendees = 0;

        let result = sqlx::query(
            r#"
            INSERT INTO events (id, title, capacity, current_attendees, created_at)
            VALUES ($1, $2, $3, 0, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(&event.title)
        .bind(event.capacity.map(i64::from))
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DuplicateEvent(event.id));
        }
        Ok(event)
    }

    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>> {
        let row = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(event_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_event).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self, contact))]
    async fn apply_create(
        &self,
        event_id: EventId,
        party_size: i64,
        contact: Contact,
    ) -> Result<AdmissionOutcome> {
        let mut tx = self.pool.begin().await?;

        // Lock the event row; concurrent creates and cancels for this event
        // queue here until we commit.
        let row = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
        ))
        .bind(event_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        // Returning early drops `tx`, which rolls it back.
        let Some(row) = row else {
            return Err(StoreError::EventNotFound(event_id));
        };
        let mut event = Self::row_to_event(&row)?;

        let party_size = match PartySize::try_from(party_size) {
            Ok(size) => size,
            Err(rejection) => return Ok(AdmissionOutcome::Rejected(rejection)),
        };

        let new_count = match evaluate(
            event.current_attendees,
            event.capacity,
            i64::from(party_size.get()),
        ) {
            Decision::Admit { new_count } => new_count,
            Decision::Reject(rejection) => return Ok(AdmissionOutcome::Rejected(rejection)),
        };

        let registration = Registration::new(event_id, party_size, contact);
        let contact_json = serde_json::to_value(&registration.contact)?;

        sqlx::query(
            r#"
            INSERT INTO registrations (id, event_id, party_size, contact, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(registration.id.as_uuid())
        .bind(event_id.as_uuid())
        .bind(i64::from(registration.party_size.get()))
        .bind(contact_json)
        .bind(registration.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE events SET current_attendees = $2 WHERE id = $1")
            .bind(event_id.as_uuid())
            .bind(i64::from(new_count))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        event.current_attendees = new_count;
        Ok(AdmissionOutcome::Admitted {
            registration,
            event,
        })
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn apply_cancel(&self, registration_id: RegistrationId) -> Result<CancellationOutcome> {
        let mut tx = self.pool.begin().await?;

        // A second cancel for the same id blocks on the row lock here and then
        // deletes nothing.
        let row = sqlx::query(
            "DELETE FROM registrations WHERE id = $1 RETURNING event_id, party_size",
        )
        .bind(registration_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(CancellationOutcome::NotFound);
        };
        let event_id = EventId::from_uuid(row.try_get::<Uuid, _>("event_id")?);
        let removed_party_size = to_party_size(row.try_get("party_size")?)?;

        let current: i64 =
            sqlx::query_scalar("SELECT current_attendees FROM events WHERE id = $1 FOR UPDATE")
                .bind(event_id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;

        let attendees_after = apply_cancellation(
            to_count("current_attendees", current)?,
            cancellation_delta(removed_party_size),
        );

        sqlx::query("UPDATE events SET current_attendees = $2 WHERE id = $1")
            .bind(event_id.as_uuid())
            .bind(i64::from(attendees_after))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(CancellationOutcome::Cancelled(CancelledRegistration {
            registration_id,
            event_id,
            removed_party_size,
            attendees_after,
        }))
    }

    async fn get_registration(
        &self,
        registration_id: RegistrationId,
    ) -> Result<Option<Registration>> {
        let row = sqlx::query(&format!(
            "SELECT {REGISTRATION_COLUMNS} FROM registrations WHERE id = $1"
        ))
        .bind(registration_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_registration).transpose()
    }

    async fn snapshot(&self, event_id: EventId) -> Result<Option<EventSnapshot>> {
        let mut tx = self.pool.begin().await?;

        // Both reads see the same committed state.
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(event_id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let event = Self::row_to_event(&row)?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {REGISTRATION_COLUMNS}
            FROM registrations
            WHERE event_id = $1
            ORDER BY created_at ASC, id ASC
            "#
        ))
        .bind(event_id.as_uuid())
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let registrations = rows
            .iter()
            .map(Self::row_to_registration)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(EventSnapshot {
            event,
            registrations,
        }))
    }
}
