//! Card Reader Bridge
//!
//! Per tap: relay the UID to every subscriber, then toggle the attendance
//! state of the member holding the card. Nothing is reported back to the
//! reader; every outcome is logged through [`record_outcome`].

use std::net::SocketAddr;
use std::time::Duration;

use gym_server::DbService;
use gym_server::services::attendance::{self, TapApplied};
use shared::AppError;
use shared::models::VisitTransition;
use shared::relay::{CardUid, RelayMessage};
use shared::util::now_millis;
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::BridgeConfig;
use crate::reader::{CardReader, ReaderEvent};
use crate::relay::{RelayHub, RelayServer};

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("database unavailable: {0}")]
    Database(#[from] AppError),

    #[error("failed to bind relay on {addr}: {source}")]
    RelayBind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// What one tap did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    CheckedIn { member_id: i64, name: String },
    CheckedOut { member_id: i64, name: String },
    /// No member holds the card
    UnknownCard,
    /// Same card again inside the debounce window
    Debounced,
    /// Store error; the tap is lost
    Failed(String),
}

/// Single sink for tap outcomes
pub fn record_outcome(uid: &CardUid, outcome: &TapOutcome) {
    match outcome {
        TapOutcome::CheckedIn { member_id, name } => {
            tracing::info!(%uid, member_id, name = %name, "Checked in")
        }
        TapOutcome::CheckedOut { member_id, name } => {
            tracing::info!(%uid, member_id, name = %name, "Checked out")
        }
        TapOutcome::UnknownCard => tracing::info!(%uid, "Unknown card, no client found"),
        TapOutcome::Debounced => tracing::debug!(%uid, "Repeat tap ignored"),
        TapOutcome::Failed(reason) => tracing::error!(%uid, reason = %reason, "Error handling card"),
    }
}

impl From<TapApplied> for TapOutcome {
    fn from(applied: TapApplied) -> Self {
        let member_id = applied.member.id;
        let name = applied.member.name;
        match applied.transition {
            VisitTransition::CheckedIn(_) => TapOutcome::CheckedIn { member_id, name },
            VisitTransition::CheckedOut(_) => TapOutcome::CheckedOut { member_id, name },
        }
    }
}

/// Owns the database pool, the relay hub and the relay server task
pub struct CardBridge {
    pool: SqlitePool,
    hub: RelayHub,
    relay: RelayServer,
    shutdown: CancellationToken,
    debounce: Option<Duration>,
    last_tap: Option<(CardUid, Instant)>,
}

impl CardBridge {
    /// Open the database and bind the relay
    pub async fn start(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let db = DbService::new(&config.database_path).await?;
        Self::with_pool(db.pool, config.relay_addr, config.debounce()).await
    }

    /// Bind the relay around an existing pool
    pub async fn with_pool(
        pool: SqlitePool,
        relay_addr: SocketAddr,
        debounce: Option<Duration>,
    ) -> Result<Self, BridgeError> {
        let hub = RelayHub::new();
        let shutdown = CancellationToken::new();
        let relay = RelayServer::bind(relay_addr, hub.clone(), shutdown.clone())
            .await
            .map_err(|source| BridgeError::RelayBind {
                addr: relay_addr,
                source,
            })?;
        Ok(Self {
            pool,
            hub,
            relay,
            shutdown,
            debounce,
            last_tap: None,
        })
    }

    pub fn relay_addr(&self) -> SocketAddr {
        self.relay.local_addr()
    }

    pub fn hub(&self) -> &RelayHub {
        &self.hub
    }

    /// Cancelling it stops [`run`](Self::run) and the relay
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn is_repeat(&mut self, uid: &CardUid) -> bool {
        let Some(window) = self.debounce else {
            return false;
        };
        let now = Instant::now();
        let repeat = matches!(
            &self.last_tap,
            Some((last, at)) if last == uid && now.duration_since(*at) < window
        );
        if !repeat {
            self.last_tap = Some((uid.clone(), now));
        }
        repeat
    }

    /// Relay the UID, then toggle the holder's visit
    pub async fn handle_tap(&mut self, uid: CardUid) -> TapOutcome {
        let outcome = if self.is_repeat(&uid) {
            TapOutcome::Debounced
        } else {
            // relayed whether or not a member holds the card
            let delivered = self.hub.publish(RelayMessage::card_tap(uid.clone()));
            tracing::debug!(%uid, delivered, "Card tap relayed");

            match attendance::apply_tap(&self.pool, &uid, now_millis()).await {
                Ok(Some(applied)) => applied.into(),
                Ok(None) => TapOutcome::UnknownCard,
                Err(e) => TapOutcome::Failed(e.to_string()),
            }
        };
        record_outcome(&uid, &outcome);
        outcome
    }

    /// Process reader events until the reader disconnects or shutdown is requested
    pub async fn run<R: CardReader>(&mut self, reader: &mut R) {
        loop {
            let event = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                event = reader.next_event() => event,
            };
            match event {
                ReaderEvent::Card(uid) => {
                    self.handle_tap(uid).await;
                }
                ReaderEvent::Error(e) => tracing::warn!("Reader error: {e}"),
                ReaderEvent::Disconnected => {
                    tracing::info!("Reader disconnected");
                    break;
                }
            }
        }
    }

    /// Stop the relay and wait for it
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        self.relay.join().await;
        self.pool.close().await;
        tracing::info!("Card bridge stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{ChannelReader, LineReader};
    use chrono::NaiveDate;
    use gym_server::db::repository::{member, visit};
    use shared::models::{MemberCreate, MembershipType};

    async fn bridge(debounce: Option<Duration>) -> (CardBridge, i64) {
        let pool = DbService::in_memory().await.unwrap().pool;
        let m = member::create(
            &pool,
            MemberCreate {
                name: "M1".into(),
                contact_number: "1".into(),
                membership_type: MembershipType::Basic,
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                expiration_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
                card_id: Some("04A2B3C4".into()),
            },
        )
        .await
        .unwrap();
        let bridge = CardBridge::with_pool(pool, "127.0.0.1:0".parse().unwrap(), debounce)
            .await
            .unwrap();
        (bridge, m.id)
    }

    fn uid(s: &str) -> CardUid {
        CardUid::new(s).unwrap()
    }

    #[tokio::test]
    async fn taps_toggle_attendance() {
        let (mut bridge, id) = bridge(None).await;
        let name = "M1".to_string();

        assert_eq!(
            bridge.handle_tap(uid("04a2b3c4")).await,
            TapOutcome::CheckedIn { member_id: id, name: name.clone() }
        );
        assert_eq!(
            bridge.handle_tap(uid("04a2b3c4")).await,
            TapOutcome::CheckedOut { member_id: id, name: name.clone() }
        );
        assert_eq!(
            bridge.handle_tap(uid("04a2b3c4")).await,
            TapOutcome::CheckedIn { member_id: id, name }
        );
        assert_eq!(visit::find_by_member(&bridge.pool, id).await.unwrap().len(), 2);
        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn unknown_card_is_relayed_but_not_stored() {
        let (mut bridge, _) = bridge(None).await;
        let mut rx = bridge.hub().subscribe();

        assert_eq!(bridge.handle_tap(uid("ffff")).await, TapOutcome::UnknownCard);
        let RelayMessage::CardTap(tap) = rx.recv().await.unwrap();
        assert_eq!(tap.uid.as_str(), "FFFF");

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM visit")
            .fetch_one(&bridge.pool)
            .await
            .unwrap();
        assert_eq!(total, 0);
        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn repeat_taps_inside_window_are_ignored() {
        let (mut bridge, id) = bridge(Some(Duration::from_secs(60))).await;
        let mut rx = bridge.hub().subscribe();

        assert!(matches!(
            bridge.handle_tap(uid("04a2b3c4")).await,
            TapOutcome::CheckedIn { .. }
        ));
        assert_eq!(bridge.handle_tap(uid("04a2b3c4")).await, TapOutcome::Debounced);
        // a different card resets the window
        assert_eq!(bridge.handle_tap(uid("ffff")).await, TapOutcome::UnknownCard);

        assert_eq!(visit::count_open(&bridge.pool, id).await.unwrap(), 1);
        rx.recv().await.unwrap();
        let RelayMessage::CardTap(second) = rx.recv().await.unwrap();
        assert_eq!(second.uid.as_str(), "FFFF");
        assert!(rx.try_recv().is_err());
        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn store_failure_is_reported_not_propagated() {
        let (mut bridge, _) = bridge(None).await;
        bridge.pool.close().await;
        assert!(matches!(
            bridge.handle_tap(uid("04a2b3c4")).await,
            TapOutcome::Failed(_)
        ));
        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn run_stops_on_disconnect_and_survives_reader_errors() {
        let (mut bridge, id) = bridge(None).await;
        let (tx, mut reader) = ChannelReader::new(8);
        tx.send(ReaderEvent::Card(uid("04a2b3c4"))).await.unwrap();
        tx.send(ReaderEvent::Error("bad read".into())).await.unwrap();
        tx.send(ReaderEvent::Card(uid("04a2b3c4"))).await.unwrap();
        tx.send(ReaderEvent::Disconnected).await.unwrap();

        bridge.run(&mut reader).await;

        let visits = visit::find_by_member(&bridge.pool, id).await.unwrap();
        assert_eq!(visits.len(), 1);
        assert!(!visits[0].is_open());
        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let (mut bridge, _) = bridge(None).await;
        let (_tx, mut reader) = ChannelReader::new(1);
        bridge.shutdown_token().cancel();
        // returns even though the reader never produces anything
        bridge.run(&mut reader).await;
        bridge.shutdown().await;
    }

    #[tokio::test]
    async fn reader_matches_cards_entered_in_any_case() {
        let (mut bridge, _) = bridge(None).await;
        let intake = MemberCreate {
            name: "M2".into(),
            contact_number: "2".into(),
            membership_type: MembershipType::Elite,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expiration_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            card_id: Some("0a1b2c3d".into()),
        }
        .normalized()
        .unwrap();
        let m = member::create(&bridge.pool, intake).await.unwrap();
        assert_eq!(m.card_id.as_deref(), Some("0A1B2C3D"));

        let mut reader = LineReader::new(
            "test",
            tokio::io::BufReader::new("04a2b3c4\n0A:1B:2C:3D\n0a1b2c3d\n".as_bytes()),
        );
        let mut outcomes = Vec::new();
        while let ReaderEvent::Card(uid) = reader.next_event().await {
            outcomes.push(bridge.handle_tap(uid).await);
        }

        assert!(matches!(&outcomes[0], TapOutcome::CheckedIn { name, .. } if name == "M1"));
        assert_eq!(
            outcomes[1],
            TapOutcome::CheckedIn { member_id: m.id, name: "M2".into() }
        );
        assert_eq!(
            outcomes[2],
            TapOutcome::CheckedOut { member_id: m.id, name: "M2".into() }
        );
        bridge.shutdown().await;
    }
}
