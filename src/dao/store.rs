//! Typed access to the five tenant-tagged collections.
//!
//! Every group-scoped query goes through the [`crate::dao::ids`] helpers so
//! legacy string-encoded references keep matching; every write stores the
//! canonical binary encoding. Match mutations are version-guarded: the filter
//! pins the version the caller read and the update bumps it, so a lost
//! read-modify-write race surfaces as a conflict instead of silent drift.

use futures::TryStreamExt;
use mongodb::{
    Collection, Database,
    bson::{Bson, Document, doc},
};
use uuid::Uuid;

use crate::dao::{
    ids::{as_bson, doc_id, either_encoding, exclude_doc_id, scoped_doc_id, tenant_filter},
    models::{
        AdminEntity, GroupEntity, MatchEntity, PlayerEntity, TeamShuffleEntity, VoteEntity,
    },
    storage::{StorageError, StorageResult, is_duplicate_key},
};
use crate::services::reconcile::StatDelta;

const GROUPS: &str = "groups";
const ADMINS: &str = "admins";
const PLAYERS: &str = "players";
const MATCHES: &str = "matches";
const VOTES: &str = "votes";
const TEAMS: &str = "teams";

/// How many matches the recent-matches view returns.
pub const RECENT_MATCH_LIMIT: i64 = 5;

/// Store facade over one database handle; cheap to construct per request.
#[derive(Clone)]
pub struct LeagueStore {
    database: Database,
}

impl LeagueStore {
    /// Wrap a database handle.
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn groups(&self) -> Collection<GroupEntity> {
        self.database.collection(GROUPS)
    }

    fn admins(&self) -> Collection<AdminEntity> {
        self.database.collection(ADMINS)
    }

    fn players(&self) -> Collection<PlayerEntity> {
        self.database.collection(PLAYERS)
    }

    fn matches(&self) -> Collection<MatchEntity> {
        self.database.collection(MATCHES)
    }

    fn votes(&self) -> Collection<VoteEntity> {
        self.database.collection(VOTES)
    }

    fn shuffles(&self) -> Collection<TeamShuffleEntity> {
        self.database.collection(TEAMS)
    }

    // -----------------------------------------------------------------------
    // Groups & admins
    // -----------------------------------------------------------------------

    /// All groups, sorted by name.
    pub async fn list_groups(&self) -> StorageResult<Vec<GroupEntity>> {
        self.groups()
            .find(doc! {})
            .sort(doc! { "name": 1 })
            .await
            .map_err(|err| StorageError::unavailable("listing groups".into(), err))?
            .try_collect()
            .await
            .map_err(|err| StorageError::unavailable("collecting groups".into(), err))
    }

    /// One group by id.
    pub async fn find_group(&self, id: Uuid) -> StorageResult<Option<GroupEntity>> {
        self.groups()
            .find_one(doc_id(id))
            .await
            .map_err(|err| StorageError::unavailable(format!("loading group {id}"), err))
    }

    /// One group by its uppercase join code.
    pub async fn find_group_by_code(&self, code: &str) -> StorageResult<Option<GroupEntity>> {
        self.groups()
            .find_one(doc! { "code": code })
            .await
            .map_err(|err| StorageError::unavailable("resolving group code".into(), err))
    }

    /// One admin account by lowercase email.
    pub async fn find_admin_by_email(&self, email: &str) -> StorageResult<Option<AdminEntity>> {
        self.admins()
            .find_one(doc! { "email": email })
            .await
            .map_err(|err| StorageError::unavailable("loading admin account".into(), err))
    }

    // -----------------------------------------------------------------------
    // Players
    // -----------------------------------------------------------------------

    /// All players of a group, sorted by name.
    pub async fn list_players(&self, group_id: Uuid) -> StorageResult<Vec<PlayerEntity>> {
        self.players()
            .find(tenant_filter(group_id))
            .sort(doc! { "name": 1 })
            .await
            .map_err(|err| StorageError::unavailable("listing players".into(), err))?
            .try_collect()
            .await
            .map_err(|err| StorageError::unavailable("collecting players".into(), err))
    }

    /// One player by id, scoped to the caller's group.
    pub async fn find_player(
        &self,
        id: Uuid,
        group_id: Uuid,
    ) -> StorageResult<Option<PlayerEntity>> {
        self.players()
            .find_one(scoped_doc_id(id, group_id))
            .await
            .map_err(|err| StorageError::unavailable(format!("loading player {id}"), err))
    }

    /// Players by ids within a group; silently drops cross-tenant ids.
    pub async fn find_players_by_ids(
        &self,
        ids: &[Uuid],
        group_id: Uuid,
    ) -> StorageResult<Vec<PlayerEntity>> {
        let mut id_values: Vec<Bson> = Vec::with_capacity(ids.len() * 2);
        for id in ids {
            id_values.push(as_bson(*id));
            id_values.push(Bson::String(id.to_string()));
        }
        let mut filter = doc! { "_id": { "$in": id_values } };
        filter.extend(tenant_filter(group_id));

        self.players()
            .find(filter)
            .await
            .map_err(|err| StorageError::unavailable("loading players by ids".into(), err))?
            .try_collect()
            .await
            .map_err(|err| StorageError::unavailable("collecting players by ids".into(), err))
    }

    /// One player by exact (trim-compared) name, optionally excluding an id.
    pub async fn find_player_by_name(
        &self,
        group_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> StorageResult<Option<PlayerEntity>> {
        let mut filter = doc! { "name": name };
        filter.extend(tenant_filter(group_id));
        if let Some(id) = exclude {
            filter.extend(exclude_doc_id(id));
        }

        self.players()
            .find_one(filter)
            .await
            .map_err(|err| StorageError::unavailable("checking player name".into(), err))
    }

    /// Persist a new player.
    pub async fn insert_player(&self, player: &PlayerEntity) -> StorageResult<()> {
        self.players()
            .insert_one(player)
            .await
            .map_err(|err| StorageError::unavailable("inserting player".into(), err))?;
        Ok(())
    }

    /// Rename a player / replace their photo reference.
    pub async fn update_player_identity(
        &self,
        id: Uuid,
        group_id: Uuid,
        name: &str,
        photo_url: &str,
    ) -> StorageResult<bool> {
        let result = self
            .players()
            .update_one(
                scoped_doc_id(id, group_id),
                doc! { "$set": { "name": name, "photo_url": photo_url } },
            )
            .await
            .map_err(|err| StorageError::unavailable(format!("updating player {id}"), err))?;
        Ok(result.matched_count > 0)
    }

    /// Remove a player.
    pub async fn delete_player(&self, id: Uuid, group_id: Uuid) -> StorageResult<bool> {
        let result = self
            .players()
            .delete_one(scoped_doc_id(id, group_id))
            .await
            .map_err(|err| StorageError::unavailable(format!("deleting player {id}"), err))?;
        Ok(result.deleted_count > 0)
    }

    /// Apply one appearance delta to a player, group-scoped.
    ///
    /// A cross-tenant id simply matches nothing; that is the intended
    /// silent-ignore behavior for foreign references.
    pub async fn apply_appearance_delta(
        &self,
        player_id: Uuid,
        group_id: Uuid,
        delta: i64,
    ) -> StorageResult<()> {
        if delta == 0 {
            return Ok(());
        }
        self.players()
            .update_one(
                scoped_doc_id(player_id, group_id),
                doc! { "$inc": { "total_appearances": delta } },
            )
            .await
            .map_err(|err| StorageError::unavailable("applying appearance delta".into(), err))?;
        Ok(())
    }

    /// Apply one combined stat delta to a player, group-scoped.
    ///
    /// Only the non-zero kinds go into the increment document so unchanged
    /// counters see no write at all.
    pub async fn apply_stat_delta(
        &self,
        player_id: Uuid,
        group_id: Uuid,
        delta: StatDelta,
        appearance_delta: i64,
    ) -> StorageResult<()> {
        let mut inc = Document::new();
        if delta.goals != 0 {
            inc.insert("total_goals", delta.goals);
        }
        if delta.assists != 0 {
            inc.insert("total_assists", delta.assists);
        }
        if delta.saves != 0 {
            inc.insert("total_saves", delta.saves);
        }
        if appearance_delta != 0 {
            inc.insert("total_appearances", appearance_delta);
        }
        if inc.is_empty() {
            return Ok(());
        }

        self.players()
            .update_one(scoped_doc_id(player_id, group_id), doc! { "$inc": inc })
            .await
            .map_err(|err| StorageError::unavailable("applying stat delta".into(), err))?;
        Ok(())
    }

    /// Adjust a player's MVP counter, group-scoped.
    pub async fn apply_mvp_delta(
        &self,
        player_id: Uuid,
        group_id: Uuid,
        delta: i64,
    ) -> StorageResult<()> {
        self.players()
            .update_one(
                scoped_doc_id(player_id, group_id),
                doc! { "$inc": { "total_mvp": delta } },
            )
            .await
            .map_err(|err| StorageError::unavailable("applying MVP delta".into(), err))?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Matches
    // -----------------------------------------------------------------------

    /// Persist a new match.
    pub async fn insert_match(&self, entity: &MatchEntity) -> StorageResult<()> {
        self.matches()
            .insert_one(entity)
            .await
            .map_err(|err| StorageError::unavailable("inserting match".into(), err))?;
        Ok(())
    }

    /// One match by id, scoped to the caller's group.
    pub async fn find_match(&self, id: Uuid, group_id: Uuid) -> StorageResult<Option<MatchEntity>> {
        self.matches()
            .find_one(scoped_doc_id(id, group_id))
            .await
            .map_err(|err| StorageError::unavailable(format!("loading match {id}"), err))
    }

    /// One match by id without tenant scoping (public vote path; the match
    /// itself carries the group the ballot is tagged with).
    pub async fn find_match_unscoped(&self, id: Uuid) -> StorageResult<Option<MatchEntity>> {
        self.matches()
            .find_one(doc_id(id))
            .await
            .map_err(|err| StorageError::unavailable(format!("loading match {id}"), err))
    }

    /// Version-guarded match mutation.
    ///
    /// Applies `set` and bumps the version only when the stored version still
    /// equals `expected_version`. Returns false when the guard failed, i.e. a
    /// concurrent edit won the race.
    pub async fn update_match_guarded(
        &self,
        id: Uuid,
        expected_version: i64,
        set: Document,
    ) -> StorageResult<bool> {
        let mut filter = doc_id(id);
        filter.insert("version", expected_version);

        let result = self
            .matches()
            .update_one(filter, doc! { "$set": set, "$inc": { "version": 1 } })
            .await
            .map_err(|err| StorageError::unavailable(format!("updating match {id}"), err))?;
        Ok(result.matched_count > 0)
    }

    /// Remove a match document.
    pub async fn delete_match(&self, id: Uuid) -> StorageResult<bool> {
        let result = self
            .matches()
            .delete_one(doc_id(id))
            .await
            .map_err(|err| StorageError::unavailable(format!("deleting match {id}"), err))?;
        Ok(result.deleted_count > 0)
    }

    /// The most recent matches of a group, newest first.
    pub async fn recent_matches(&self, group_id: Uuid) -> StorageResult<Vec<MatchEntity>> {
        self.matches()
            .find(tenant_filter(group_id))
            .sort(doc! { "date": -1 })
            .limit(RECENT_MATCH_LIMIT)
            .await
            .map_err(|err| StorageError::unavailable("listing recent matches".into(), err))?
            .try_collect()
            .await
            .map_err(|err| StorageError::unavailable("collecting recent matches".into(), err))
    }

    /// The group's latest match with an open, not-yet-closed poll.
    pub async fn find_open_voting_match(
        &self,
        group_id: Uuid,
    ) -> StorageResult<Option<MatchEntity>> {
        let filter = open_poll_filter(group_id);

        self.matches()
            .find_one(filter)
            .sort(doc! { "date": -1 })
            .await
            .map_err(|err| StorageError::unavailable("finding open poll".into(), err))
    }

    /// Whether any match in the group lists the player as an attendee.
    pub async fn player_has_attendance(
        &self,
        player_id: Uuid,
        group_id: Uuid,
    ) -> StorageResult<bool> {
        let encodings = vec![as_bson(player_id), Bson::String(player_id.to_string())];
        let mut filter = doc! { "attendees": { "$in": encodings } };
        filter.extend(tenant_filter(group_id));

        let found = self
            .matches()
            .find_one(filter)
            .await
            .map_err(|err| StorageError::unavailable("checking attendance history".into(), err))?;
        Ok(found.is_some())
    }

    // -----------------------------------------------------------------------
    // Votes
    // -----------------------------------------------------------------------

    /// Persist one ballot; the unique index turns a duplicate into
    /// [`StorageError::DuplicateKey`].
    pub async fn insert_vote(&self, vote: &VoteEntity) -> StorageResult<()> {
        self.votes().insert_one(vote).await.map_err(|err| {
            if is_duplicate_key(&err) {
                StorageError::DuplicateKey { collection: VOTES }
            } else {
                StorageError::unavailable("inserting vote".into(), err)
            }
        })?;
        Ok(())
    }

    /// One ballot by (match, normalized voter name).
    pub async fn find_vote(
        &self,
        match_id: Uuid,
        voter_name: &str,
    ) -> StorageResult<Option<VoteEntity>> {
        let mut filter = either_encoding("match_id", match_id);
        filter.insert("voter_name", voter_name);

        self.votes()
            .find_one(filter)
            .await
            .map_err(|err| StorageError::unavailable("checking existing vote".into(), err))
    }

    /// All ballots of a match in cast order; the tally tie-break depends on
    /// this ordering.
    pub async fn votes_for_match(&self, match_id: Uuid) -> StorageResult<Vec<VoteEntity>> {
        self.votes()
            .find(either_encoding("match_id", match_id))
            .sort(doc! { "cast_at": 1 })
            .await
            .map_err(|err| StorageError::unavailable("listing votes".into(), err))?
            .try_collect()
            .await
            .map_err(|err| StorageError::unavailable("collecting votes".into(), err))
    }

    /// Bulk-delete every ballot of a match.
    pub async fn delete_votes_for_match(&self, match_id: Uuid) -> StorageResult<u64> {
        let result = self
            .votes()
            .delete_many(either_encoding("match_id", match_id))
            .await
            .map_err(|err| StorageError::unavailable("deleting votes".into(), err))?;
        Ok(result.deleted_count)
    }

    // -----------------------------------------------------------------------
    // Team randomizations
    // -----------------------------------------------------------------------

    /// Persist a new team-randomization record.
    pub async fn insert_shuffle(&self, shuffle: &TeamShuffleEntity) -> StorageResult<()> {
        self.shuffles()
            .insert_one(shuffle)
            .await
            .map_err(|err| StorageError::unavailable("inserting team shuffle".into(), err))?;
        Ok(())
    }

    /// The newest randomization record of a group, if any.
    pub async fn latest_shuffle(&self, group_id: Uuid) -> StorageResult<Option<TeamShuffleEntity>> {
        self.shuffles()
            .find_one(tenant_filter(group_id))
            .sort(doc! { "created_at": -1 })
            .await
            .map_err(|err| StorageError::unavailable("loading latest shuffle".into(), err))
    }

    /// Remove a randomization record, scoped to the caller's group.
    pub async fn delete_shuffle(&self, id: Uuid, group_id: Uuid) -> StorageResult<bool> {
        let result = self
            .shuffles()
            .delete_one(scoped_doc_id(id, group_id))
            .await
            .map_err(|err| StorageError::unavailable(format!("deleting shuffle {id}"), err))?;
        Ok(result.deleted_count > 0)
    }
}

/// Filter for a group's open poll.
///
/// Phase precedence makes an ended match read as closed regardless of its
/// stored flags, so the query has to exclude ended matches itself rather
/// than trust the flag pair alone.
fn open_poll_filter(group_id: Uuid) -> Document {
    let mut filter = doc! { "voting_open": true, "voting_closed": false, "ended": false };
    filter.extend(tenant_filter(group_id));
    filter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_poll_filter_excludes_ended_matches() {
        let group_id = Uuid::new_v4();
        let filter = open_poll_filter(group_id);

        assert!(filter.get_bool("voting_open").unwrap());
        assert!(!filter.get_bool("voting_closed").unwrap());
        assert!(!filter.get_bool("ended").unwrap());
        assert!(filter.get("$or").is_some());
    }

    #[test]
    fn name_conflict_exclusion_is_not_part_of_the_id_key() {
        // edit_player passes its own id as the exclusion; a photo-only edit
        // must not collide with the player's current name under either
        // stored id encoding.
        let id = Uuid::new_v4();
        let mut filter = doc! { "name": "dana" };
        filter.extend(tenant_filter(Uuid::new_v4()));
        filter.extend(exclude_doc_id(id));

        assert!(filter.get("_id").is_none());
        let clauses = filter.get_array("$nor").unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(
            clauses[1].as_document().unwrap().get_str("_id").unwrap(),
            id.to_string().as_str()
        );
    }
}
