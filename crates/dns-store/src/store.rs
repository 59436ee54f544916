//! The owner-name indexed record store: the single piece of shared,
//! mutable state in this server, held behind a `tokio::sync::RwLock`
//! so any number of concurrent workers can read it while a writer
//! waits its turn, without blocking the executor thread.

use std::collections::HashMap;

use tokio::sync::RwLock;

use dns_proto::{DomainName, RecordType, ResourceRecord};

use crate::error::Error;

/// An owner-name indexed collection of resource records. `Add` is the
/// only way records enter the store; after that the store is their
/// sole owner.
#[derive(Debug, Default)]
pub struct Store {
    backing: RwLock<HashMap<DomainName, Vec<ResourceRecord>>>,
}

impl Store {
    pub fn new() -> Self {
        Store {
            backing: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a record, appending it to any existing records sharing
    /// its owner name. Insertion order is preserved and is the order
    /// later lookups return.
    pub async fn add(&self, record: ResourceRecord) -> Result<(), Error> {
        let mut backing = self.backing.write().await;
        backing.entry(record.name.clone()).or_default().push(record);
        Ok(())
    }

    /// Remove the first record matching both the owner name and type
    /// of `record`, preserving the order of whatever remains.
    pub async fn delete(&self, record: &ResourceRecord) -> Result<(), Error> {
        let mut backing = self.backing.write().await;
        let collection = backing.get_mut(&record.name).ok_or(Error::NotFound)?;
        let index = collection
            .iter()
            .position(|existing| existing.name == record.name && existing.data.rtype() == record.data.rtype())
            .ok_or(Error::NotFound)?;
        collection.remove(index);
        Ok(())
    }

    /// The single record at `name` of type `rtype`, if any.
    pub async fn find(&self, name: &DomainName, rtype: RecordType) -> Result<ResourceRecord, Error> {
        let backing = self.backing.read().await;
        let collection = backing.get(name).ok_or(Error::NotFound)?;
        collection
            .iter()
            .find(|rr| rr.data.rtype() == rtype)
            .cloned()
            .ok_or(Error::NotFound)
    }

    /// Every record at `name`, regardless of type, in insertion order.
    pub async fn find_label(&self, name: &DomainName) -> Result<Vec<ResourceRecord>, Error> {
        let backing = self.backing.read().await;
        backing.get(name).cloned().ok_or(Error::NotFound)
    }

    /// Remove the first record at `name` of type `rtype`.
    pub async fn find_and_delete(&self, name: &DomainName, rtype: RecordType) -> Result<(), Error> {
        if let RecordType::Unknown(0) = rtype {
            return Err(Error::InvalidType);
        }
        let mut backing = self.backing.write().await;
        let collection = backing.get_mut(name).ok_or(Error::NotFound)?;
        let index = collection
            .iter()
            .position(|rr| rr.data.rtype() == rtype)
            .ok_or(Error::NotFound)?;
        collection.remove(index);
        Ok(())
    }

    /// Replace the first record at `name` of type `rtype` with
    /// `newer`, preserving its position in insertion order.
    pub async fn find_and_replace(
        &self,
        name: &DomainName,
        rtype: RecordType,
        newer: ResourceRecord,
    ) -> Result<(), Error> {
        if let RecordType::Unknown(0) = rtype {
            return Err(Error::InvalidType);
        }
        let mut backing = self.backing.write().await;
        let collection = backing.get_mut(name).ok_or(Error::NotFound)?;
        let index = collection
            .iter()
            .position(|rr| rr.data.rtype() == rtype)
            .ok_or(Error::NotFound)?;
        collection[index] = newer;
        Ok(())
    }

    /// The CNAME-chasing recursive lookup used for `A`/`AAAA`
    /// questions. For each record at `name`: a `CNAME` is appended and
    /// then its target is looked up (non-recursively) for `A` and
    /// `AAAA`, each silently dropped on `NotFound`; a record whose type
    /// already matches `rtype` is appended as-is. Depth-1 only: the
    /// sub-lookup never calls back into `find_recursively`, so no
    /// chain-walking and therefore no cycle is reachable.
    pub async fn find_recursively(
        &self,
        name: &DomainName,
        rtype: RecordType,
    ) -> Result<Vec<ResourceRecord>, Error> {
        if let RecordType::Unknown(0) = rtype {
            return Err(Error::InvalidType);
        }

        let collection = {
            let backing = self.backing.read().await;
            backing.get(name).cloned().ok_or(Error::NotFound)?
        };

        let mut result = Vec::new();
        for record in collection {
            if let dns_proto::RecordData::CNAME { name: target, .. } = &record.data {
                let target = target.clone();
                result.push(record);

                match self.find(&target, RecordType::A).await {
                    Ok(rr) => result.push(rr),
                    Err(Error::NotFound) => {}
                    Err(err) => return Err(err),
                }
                match self.find(&target, RecordType::AAAA).await {
                    Ok(rr) => result.push(rr),
                    Err(Error::NotFound) => {}
                    Err(err) => return Err(err),
                }
            } else if record.data.rtype() == rtype {
                result.push(record);
            }
        }

        Ok(result)
    }

    /// Total number of records held, across all owner names.
    pub async fn size(&self) -> usize {
        let backing = self.backing.read().await;
        backing.values().map(Vec::len).sum()
    }

    /// Number of records held at a single owner name.
    pub async fn label_size(&self, name: &DomainName) -> usize {
        let backing = self.backing.read().await;
        backing.get(name).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn domain(s: &str) -> DomainName {
        DomainName::from_dotted_string(s).unwrap()
    }

    fn a(name: &str, ttl: u32, addr: [u8; 4]) -> ResourceRecord {
        ResourceRecord::a(domain(name), ttl, Ipv4Addr::from(addr)).unwrap()
    }

    #[tokio::test]
    async fn add_then_find() {
        let store = Store::new();
        store.add(a("zed.io", 10, [127, 0, 0, 1])).await.unwrap();

        let found = store.find(&domain("zed.io"), RecordType::A).await.unwrap();
        assert_eq!(found, a("zed.io", 10, [127, 0, 0, 1]));
    }

    #[tokio::test]
    async fn find_on_empty_store_is_not_found() {
        let store = Store::new();
        assert!(matches!(
            store.find(&domain("zed.io"), RecordType::A).await,
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn find_wrong_type_is_not_found() {
        let store = Store::new();
        store.add(a("zed.io", 10, [127, 0, 0, 1])).await.unwrap();
        assert!(matches!(
            store.find(&domain("zed.io"), RecordType::AAAA).await,
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn insertion_order_is_preserved() {
        let store = Store::new();
        store.add(a("zed.io", 10, [1, 1, 1, 1])).await.unwrap();
        store
            .add(
                ResourceRecord::aaaa(
                    domain("zed.io"),
                    10,
                    "::1".parse().unwrap(),
                )
                .unwrap(),
            )
            .await
            .unwrap();
        store.add(a("zed.io", 10, [2, 2, 2, 2])).await.unwrap();

        let all = store.find_label(&domain("zed.io")).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0], a("zed.io", 10, [1, 1, 1, 1]));
        assert_eq!(all[2], a("zed.io", 10, [2, 2, 2, 2]));
    }

    #[tokio::test]
    async fn delete_by_record_removes_matching_name_and_type() {
        let store = Store::new();
        store.add(a("zed.io", 10, [1, 1, 1, 1])).await.unwrap();
        store.add(a("other.io", 10, [2, 2, 2, 2])).await.unwrap();

        store.delete(&a("zed.io", 10, [1, 1, 1, 1])).await.unwrap();

        assert!(matches!(
            store.find(&domain("zed.io"), RecordType::A).await,
            Err(Error::NotFound)
        ));
        assert_eq!(store.size().await, 1);
    }

    #[tokio::test]
    async fn delete_missing_record_is_not_found() {
        let store = Store::new();
        assert!(matches!(
            store.delete(&a("zed.io", 10, [1, 1, 1, 1])).await,
            Err(Error::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_preserves_order_of_rest() {
        let store = Store::new();
        store.add(a("zed.io", 10, [1, 1, 1, 1])).await.unwrap();
        store.add(a("zed.io", 10, [2, 2, 2, 2])).await.unwrap();
        store.add(a("zed.io", 10, [3, 3, 3, 3])).await.unwrap();

        store
            .find_and_delete(&domain("zed.io"), RecordType::A)
            .await
            .unwrap();

        // Only one A record remains: the first match was removed.
        let remaining = store.find_label(&domain("zed.io")).await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0], a("zed.io", 10, [2, 2, 2, 2]));
    }

    #[tokio::test]
    async fn replace_preserves_position() {
        let store = Store::new();
        store.add(a("zed.io", 10, [1, 1, 1, 1])).await.unwrap();
        store.add(a("zed.io", 10, [2, 2, 2, 2])).await.unwrap();

        store
            .find_and_replace(
                &domain("zed.io"),
                RecordType::A,
                a("zed.io", 20, [9, 9, 9, 9]),
            )
            .await
            .unwrap();

        let all = store.find_label(&domain("zed.io")).await.unwrap();
        assert_eq!(all[0], a("zed.io", 20, [9, 9, 9, 9]));
    }

    #[tokio::test]
    async fn find_and_delete_invalid_type_zero() {
        let store = Store::new();
        assert!(matches!(
            store
                .find_and_delete(&domain("zed.io"), RecordType::Unknown(0))
                .await,
            Err(Error::InvalidType)
        ));
    }

    #[tokio::test]
    async fn cname_chase_s7() {
        let store = Store::new();
        store
            .add(ResourceRecord::cname(domain("www.zed.io"), 10, domain("zed.io")).unwrap())
            .await
            .unwrap();
        store.add(a("zed.io", 10, [1, 2, 3, 4])).await.unwrap();

        let answers = store
            .find_recursively(&domain("www.zed.io"), RecordType::A)
            .await
            .unwrap();

        assert_eq!(answers.len(), 2);
        assert!(matches!(answers[0].data, dns_proto::RecordData::CNAME { .. }));
        assert_eq!(answers[1], a("zed.io", 10, [1, 2, 3, 4]));
    }

    #[tokio::test]
    async fn cname_chase_missing_target_is_silent() {
        let store = Store::new();
        store
            .add(ResourceRecord::cname(domain("www.zed.io"), 10, domain("zed.io")).unwrap())
            .await
            .unwrap();
        // no A/AAAA record at zed.io

        let answers = store
            .find_recursively(&domain("www.zed.io"), RecordType::A)
            .await
            .unwrap();

        assert_eq!(answers.len(), 1);
        assert!(matches!(answers[0].data, dns_proto::RecordData::CNAME { .. }));
    }

    #[tokio::test]
    async fn label_size_and_size() {
        let store = Store::new();
        store.add(a("zed.io", 10, [1, 1, 1, 1])).await.unwrap();
        store.add(a("zed.io", 10, [2, 2, 2, 2])).await.unwrap();
        store.add(a("other.io", 10, [3, 3, 3, 3])).await.unwrap();

        assert_eq!(store.size().await, 3);
        assert_eq!(store.label_size(&domain("zed.io")).await, 2);
        assert_eq!(store.label_size(&domain("nonexistent.io")).await, 0);
    }
}
