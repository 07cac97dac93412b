//! # Registry Service
//!
//! The floor map's supporting cast: seats (listing, maintenance
//! flagging, tile positions) and clients (create, search, rename). No
//! billing invariants live here - the session lifecycle owns the
//! available/occupied transitions - but maintenance flagging still goes
//! through the conditional transition so it cannot yank a seat out from
//! under an active session.

use tracing::info;

use cabina_core::validation::validate_client_name;
use cabina_core::{Client, Seat, SeatStatus};
use cabina_db::Database;

use crate::error::{ServiceError, ServiceResult};

/// Seat and client registry operations.
#[derive(Debug, Clone)]
pub struct RegistryService {
    db: Database,
}

impl RegistryService {
    /// Creates a new RegistryService over a database handle.
    pub fn new(db: Database) -> Self {
        RegistryService { db }
    }

    // =========================================================================
    // Seats
    // =========================================================================

    /// All seats, for the floor map.
    pub async fn seats(&self) -> ServiceResult<Vec<Seat>> {
        Ok(self.db.seats().list().await?)
    }

    /// Seats currently free, for the move-session picker.
    pub async fn available_seats(&self) -> ServiceResult<Vec<Seat>> {
        Ok(self.db.seats().list_available().await?)
    }

    /// Flags a free seat for maintenance, or returns it to service.
    ///
    /// Both directions are conditional transitions: a seat hosting an
    /// active session cannot be flagged, and only a flagged seat can be
    /// returned to service.
    pub async fn set_maintenance(&self, seat_id: &str, on: bool) -> ServiceResult<Seat> {
        let (from, to) = if on {
            (SeatStatus::Available, SeatStatus::Maintenance)
        } else {
            (SeatStatus::Maintenance, SeatStatus::Available)
        };

        let won = self.db.seats().try_transition(seat_id, from, to).await?;
        if !won {
            return Err(ServiceError::SeatUnavailable {
                seat: seat_id.to_string(),
            });
        }

        info!(seat_id = %seat_id, maintenance = on, "Seat maintenance flag updated");

        self.db
            .seats()
            .get_by_id(seat_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Seat", seat_id))
    }

    /// Saves a seat tile's dashboard position.
    pub async fn update_seat_position(&self, seat_id: &str, x: f64, y: f64) -> ServiceResult<()> {
        self.db.seats().update_position(seat_id, x, y).await?;
        Ok(())
    }

    // =========================================================================
    // Clients
    // =========================================================================

    /// Registers a new client.
    pub async fn add_client(&self, name: &str, nickname: Option<&str>) -> ServiceResult<Client> {
        validate_client_name(name)?;

        let client = self.db.clients().insert(name.trim(), nickname).await?;
        info!(client_id = %client.id, name = %client.name, "Client registered");
        Ok(client)
    }

    /// Searches clients by name or nickname prefix.
    pub async fn search_clients(&self, query: &str) -> ServiceResult<Vec<Client>> {
        Ok(self.db.clients().search(query, 50).await?)
    }

    /// Renames a client (name and/or nickname).
    pub async fn update_client(
        &self,
        client_id: &str,
        name: &str,
        nickname: Option<&str>,
    ) -> ServiceResult<()> {
        validate_client_name(name)?;
        self.db
            .clients()
            .update_name(client_id, name.trim(), nickname)
            .await?;
        Ok(())
    }
}
