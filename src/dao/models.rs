use std::collections::BTreeMap;

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::ids::{
    lenient_uuid, lenient_uuid_opt, lenient_uuid_vec, uuid_binary, uuid_binary_opt, uuid_binary_vec,
};
use crate::state::lifecycle::MatchPhase;

/// Tenant boundary. Immutable once created; owns players, matches and teams.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupEntity {
    /// Primary key of the group.
    #[serde(rename = "_id", serialize_with = "uuid_binary", deserialize_with = "lenient_uuid")]
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-text description shown on the join screen.
    #[serde(default)]
    pub description: String,
    /// 6-character join code, stored uppercase.
    pub code: String,
}

/// Admin account able to manage one group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminEntity {
    /// Primary key of the admin.
    #[serde(rename = "_id", serialize_with = "uuid_binary", deserialize_with = "lenient_uuid")]
    pub id: Uuid,
    /// Login email, stored lowercase.
    pub email: String,
    /// Bcrypt hash of the admin password.
    pub password_hash: String,
    /// Group this admin manages.
    #[serde(serialize_with = "uuid_binary", deserialize_with = "lenient_uuid")]
    pub group_id: Uuid,
}

/// Player belonging to exactly one group, carrying cumulative aggregates.
///
/// The counters are only ever adjusted through reconciliation deltas; they
/// must equal the sum of contributions across the player's matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerEntity {
    /// Primary key of the player.
    #[serde(rename = "_id", serialize_with = "uuid_binary", deserialize_with = "lenient_uuid")]
    pub id: Uuid,
    /// Owning group.
    #[serde(serialize_with = "uuid_binary", deserialize_with = "lenient_uuid")]
    pub group_id: Uuid,
    /// Display name, unique within the group (trim-compared).
    pub name: String,
    /// Optional photo reference.
    #[serde(default)]
    pub photo_url: String,
    /// Cumulative goals across matches.
    #[serde(default)]
    pub total_goals: i64,
    /// Cumulative assists across matches.
    #[serde(default)]
    pub total_assists: i64,
    /// Cumulative saves across matches.
    #[serde(default)]
    pub total_saves: i64,
    /// Number of MVP titles won.
    #[serde(default)]
    pub total_mvp: i64,
    /// Number of matches attended.
    #[serde(default)]
    pub total_appearances: i64,
    /// Creation timestamp.
    pub created_at: DateTime,
}

/// Per-match stat maps, each keyed by the player's hyphenated UUID.
///
/// String keys are a BSON constraint; the reconciliation engine works on the
/// same representation and the persistence layer parses keys at the apply
/// boundary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchStats {
    /// Goals scored per player.
    #[serde(default)]
    pub goals: BTreeMap<String, i64>,
    /// Assists per player.
    #[serde(default)]
    pub assists: BTreeMap<String, i64>,
    /// Saves per player.
    #[serde(default)]
    pub saves: BTreeMap<String, i64>,
}

/// A logged match within a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEntity {
    /// Primary key of the match.
    #[serde(rename = "_id", serialize_with = "uuid_binary", deserialize_with = "lenient_uuid")]
    pub id: Uuid,
    /// Owning group.
    #[serde(serialize_with = "uuid_binary", deserialize_with = "lenient_uuid")]
    pub group_id: Uuid,
    /// Scheduled date of the match.
    pub date: DateTime,
    /// Players marked present.
    #[serde(default, serialize_with = "uuid_binary_vec", deserialize_with = "lenient_uuid_vec")]
    pub attendees: Vec<Uuid>,
    /// Restricted MVP candidate list; empty means every attendee is eligible.
    #[serde(default, serialize_with = "uuid_binary_vec", deserialize_with = "lenient_uuid_vec")]
    pub mvp_candidates: Vec<Uuid>,
    /// Per-player stat maps recorded for this match.
    #[serde(default)]
    pub stats: MatchStats,
    /// Winner of the MVP poll once voting closed.
    #[serde(default, serialize_with = "uuid_binary_opt", deserialize_with = "lenient_uuid_opt")]
    pub mvp_winner_id: Option<Uuid>,
    /// Voting currently accepting ballots.
    #[serde(default)]
    pub voting_open: bool,
    /// Voting has been closed (irreversible).
    #[serde(default)]
    pub voting_closed: bool,
    /// Match is frozen; no further mutation allowed.
    #[serde(default)]
    pub ended: bool,
    /// Optional free-text objective for the match.
    #[serde(default)]
    pub match_goal: Option<String>,
    /// Optional video reference.
    #[serde(default)]
    pub video_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime,
    /// Set when the match was ended.
    #[serde(default)]
    pub ended_at: Option<DateTime>,
    /// Optimistic-concurrency counter; bumped by every guarded mutation.
    #[serde(default)]
    pub version: i64,
}

impl MatchEntity {
    /// Derive the lifecycle phase from the persisted flag triple.
    pub fn phase(&self) -> MatchPhase {
        MatchPhase::from_flags(self.voting_open, self.voting_closed, self.ended)
    }
}

/// One MVP ballot; at most one per (match, normalized voter name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteEntity {
    /// Primary key of the vote.
    #[serde(rename = "_id", serialize_with = "uuid_binary", deserialize_with = "lenient_uuid")]
    pub id: Uuid,
    /// Match the ballot belongs to.
    #[serde(serialize_with = "uuid_binary", deserialize_with = "lenient_uuid")]
    pub match_id: Uuid,
    /// Group the match belongs to (denormalized for scoped queries).
    #[serde(serialize_with = "uuid_binary", deserialize_with = "lenient_uuid")]
    pub group_id: Uuid,
    /// Voter name, trimmed and lowercased.
    pub voter_name: String,
    /// Candidate the ballot was cast for.
    #[serde(serialize_with = "uuid_binary", deserialize_with = "lenient_uuid")]
    pub player_voted_for: Uuid,
    /// When the ballot was cast; tally order follows this.
    pub cast_at: DateTime,
}

/// Player identity captured at randomization time, not a live reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSnapshot {
    /// Player id at capture time.
    #[serde(serialize_with = "uuid_binary", deserialize_with = "lenient_uuid")]
    pub id: Uuid,
    /// Name at capture time.
    pub name: String,
    /// Photo reference at capture time.
    #[serde(default)]
    pub photo_url: String,
}

/// A team-randomization record; the newest one per group is the active one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamShuffleEntity {
    /// Primary key of the record.
    #[serde(rename = "_id", serialize_with = "uuid_binary", deserialize_with = "lenient_uuid")]
    pub id: Uuid,
    /// Owning group.
    #[serde(serialize_with = "uuid_binary", deserialize_with = "lenient_uuid")]
    pub group_id: Uuid,
    /// Ordered teams, each an ordered list of player snapshots.
    pub teams: Vec<Vec<PlayerSnapshot>>,
    /// Creation timestamp; newest wins.
    pub created_at: DateTime,
    /// Email of the admin who created the record.
    pub created_by: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{self, Bson, spec::BinarySubtype};

    #[test]
    fn match_entity_writes_binary_ids() {
        let entity = MatchEntity {
            id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            date: DateTime::now(),
            attendees: vec![Uuid::new_v4(), Uuid::new_v4()],
            mvp_candidates: vec![],
            stats: MatchStats::default(),
            mvp_winner_id: Some(Uuid::new_v4()),
            voting_open: false,
            voting_closed: false,
            ended: false,
            match_goal: None,
            video_url: None,
            created_at: DateTime::now(),
            ended_at: None,
            version: 0,
        };

        let doc = bson::serialize_to_document(&entity).unwrap();

        for key in ["_id", "group_id", "mvp_winner_id"] {
            let Some(Bson::Binary(binary)) = doc.get(key) else {
                panic!("expected binary {key}, got {:?}", doc.get(key));
            };
            assert_eq!(binary.subtype, BinarySubtype::Uuid);
        }
        let attendees = doc.get_array("attendees").unwrap();
        assert!(
            attendees
                .iter()
                .all(|v| matches!(v, Bson::Binary(b) if b.subtype == BinarySubtype::Uuid))
        );
    }

    #[test]
    fn match_entity_reads_legacy_string_ids() {
        let id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        let attendee = Uuid::new_v4();
        let doc = bson::doc! {
            "_id": id.to_string(),
            "group_id": group_id.to_string(),
            "date": DateTime::now(),
            "attendees": [attendee.to_string()],
            "created_at": DateTime::now(),
        };

        let entity: MatchEntity = bson::deserialize_from_document(doc).unwrap();
        assert_eq!(entity.id, id);
        assert_eq!(entity.group_id, group_id);
        assert_eq!(entity.attendees, vec![attendee]);
        assert_eq!(entity.mvp_winner_id, None);
        assert_eq!(entity.version, 0);
    }
}
