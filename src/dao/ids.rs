//! Identifier encoding at the persistence boundary.
//!
//! Ids are UUIDs. The canonical stored form is a BSON binary with the UUID
//! subtype, but legacy documents may carry the hyphenated string form
//! instead. Every write goes through the serializers below and normalizes to
//! canonical; every query built here matches either encoding so legacy
//! references keep resolving.

use mongodb::bson::{Binary, Bson, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Canonical binary encoding of a UUID.
pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.as_bytes().to_vec(),
    }
}

/// Canonical encoding as a [`Bson`] value, for `$in` lists and the like.
pub fn as_bson(id: Uuid) -> Bson {
    Bson::Binary(uuid_as_binary(id))
}

/// Filter matching `field` under either id encoding.
pub fn either_encoding(field: &str, id: Uuid) -> Document {
    doc! {
        "$or": [
            { field: uuid_as_binary(id) },
            { field: id.to_string() },
        ]
    }
}

/// Filter excluding the document whose `_id` is `id`, either encoding.
///
/// The negation of [`doc_id`]: a document is excluded when it matches the
/// binary or the string form, so it works against legacy string ids too.
pub fn exclude_doc_id(id: Uuid) -> Document {
    doc! {
        "$nor": [
            { "_id": uuid_as_binary(id) },
            { "_id": id.to_string() },
        ]
    }
}

/// Primary-key filter matching either id encoding.
///
/// Extra top-level conditions may be inserted into the returned document;
/// they combine with the `$or` as an implicit `$and`.
pub fn doc_id(id: Uuid) -> Document {
    either_encoding("_id", id)
}

/// Tenant filter matching `group_id` under either encoding.
pub fn tenant_filter(group_id: Uuid) -> Document {
    either_encoding("group_id", group_id)
}

/// Primary-key filter additionally scoped to a tenant.
///
/// Two encoding-tolerant clauses cannot share a top-level `$or`, so they are
/// combined with an explicit `$and`.
pub fn scoped_doc_id(id: Uuid, group_id: Uuid) -> Document {
    doc! {
        "$and": [
            either_encoding("_id", id),
            either_encoding("group_id", group_id),
        ]
    }
}

/// Serialize a UUID as the canonical binary encoding.
///
/// The driver's plain `uuid::Uuid` integration writes a string; routing every
/// id field through here is what makes "writes are canonical" actually true.
pub fn uuid_binary<S>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    uuid_as_binary(*id).serialize(serializer)
}

/// Serialize an optional UUID as the canonical binary encoding.
pub fn uuid_binary_opt<S>(id: &Option<Uuid>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    id.map(uuid_as_binary).serialize(serializer)
}

/// Serialize a list of UUIDs as the canonical binary encoding.
pub fn uuid_binary_vec<S>(ids: &[Uuid], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let encoded: Vec<Binary> = ids.iter().copied().map(uuid_as_binary).collect();
    encoded.serialize(serializer)
}

fn resolve_stored_uuid<E: serde::de::Error>(value: Bson) -> Result<Uuid, E> {
    match value {
        Bson::Binary(binary) => {
            let bytes: [u8; 16] = binary.bytes.as_slice().try_into().map_err(|_| {
                E::custom(format!(
                    "binary UUID must be 16 bytes, got {}",
                    binary.bytes.len()
                ))
            })?;
            Ok(Uuid::from_bytes(bytes))
        }
        Bson::String(raw) => {
            Uuid::parse_str(&raw).map_err(|_| E::custom(format!("invalid UUID string `{raw}`")))
        }
        other => Err(E::custom(format!(
            "expected a binary or string UUID, got {}",
            other.element_type() as u8
        ))),
    }
}

/// Deserialize a UUID stored under either encoding.
pub fn lenient_uuid<'de, D>(deserializer: D) -> Result<Uuid, D::Error>
where
    D: Deserializer<'de>,
{
    resolve_stored_uuid(Bson::deserialize(deserializer)?)
}

/// Deserialize an optional UUID stored under either encoding.
pub fn lenient_uuid_opt<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Bson>::deserialize(deserializer)? {
        None | Some(Bson::Null) => Ok(None),
        Some(value) => resolve_stored_uuid(value).map(Some),
    }
}

/// Deserialize a list of UUIDs stored under either encoding, mixed forms
/// allowed within one list.
pub fn lenient_uuid_vec<'de, D>(deserializer: D) -> Result<Vec<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    let stored = Vec::<Bson>::deserialize(deserializer)?;
    stored.into_iter().map(resolve_stored_uuid).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{self, Bson};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Holder {
        #[serde(serialize_with = "uuid_binary", deserialize_with = "lenient_uuid")]
        id: Uuid,
    }

    #[test]
    fn either_encoding_lists_both_forms() {
        let id = Uuid::new_v4();
        let filter = either_encoding("group_id", id);

        let Some(Bson::Array(clauses)) = filter.get("$or") else {
            panic!("expected an $or array");
        };
        assert_eq!(clauses.len(), 2);

        let binary_clause = clauses[0].as_document().unwrap();
        assert!(matches!(binary_clause.get("group_id"), Some(Bson::Binary(_))));

        let string_clause = clauses[1].as_document().unwrap();
        assert_eq!(
            string_clause.get_str("group_id").unwrap(),
            id.to_string().as_str()
        );
    }

    #[test]
    fn scoped_doc_id_keeps_both_clauses() {
        let filter = scoped_doc_id(Uuid::new_v4(), Uuid::new_v4());
        let Some(Bson::Array(clauses)) = filter.get("$and") else {
            panic!("expected an $and array");
        };
        assert_eq!(clauses.len(), 2);
    }

    #[test]
    fn exclusion_covers_both_encodings() {
        let id = Uuid::new_v4();
        let filter = exclude_doc_id(id);

        let Some(Bson::Array(clauses)) = filter.get("$nor") else {
            panic!("expected a $nor array");
        };
        assert_eq!(clauses.len(), 2);
        assert!(matches!(
            clauses[0].as_document().unwrap().get("_id"),
            Some(Bson::Binary(_))
        ));
        assert_eq!(
            clauses[1].as_document().unwrap().get_str("_id").unwrap(),
            id.to_string().as_str()
        );
    }

    #[test]
    fn serializer_writes_canonical_binary() {
        let id = Uuid::new_v4();
        let doc = bson::serialize_to_document(&Holder { id }).unwrap();

        let Some(Bson::Binary(binary)) = doc.get("id") else {
            panic!("expected a binary id, got {:?}", doc.get("id"));
        };
        assert_eq!(binary.subtype, BinarySubtype::Uuid);
        assert_eq!(binary.bytes, id.as_bytes().to_vec());
    }

    #[test]
    fn binary_round_trips_through_lenient_decoding() {
        let id = Uuid::new_v4();
        let doc = bson::serialize_to_document(&Holder { id }).unwrap();
        let holder: Holder = bson::deserialize_from_document(doc).unwrap();
        assert_eq!(holder.id, id);
    }

    #[test]
    fn lenient_accepts_legacy_string() {
        let id = Uuid::new_v4();
        let doc = bson::doc! { "id": id.to_string() };
        let holder: Holder = bson::deserialize_from_document(doc).unwrap();
        assert_eq!(holder.id, id);
    }

    #[test]
    fn lenient_accepts_native_binary() {
        let id = Uuid::new_v4();
        let doc = bson::doc! { "id": uuid_as_binary(id) };
        let holder: Holder = bson::deserialize_from_document(doc).unwrap();
        assert_eq!(holder.id, id);
    }

    #[test]
    fn lenient_rejects_garbage() {
        let doc = bson::doc! { "id": "not-a-uuid" };
        assert!(bson::deserialize_from_document::<Holder>(doc).is_err());

        let doc = bson::doc! { "id": 42 };
        assert!(bson::deserialize_from_document::<Holder>(doc).is_err());
    }
}
