//! Saved delivery addresses and the one-default-per-user rule.

use common::{AddressId, AddressType, UserId};
use serde::Deserialize;
use store::{Address, AddressFields, AddressStore};

use crate::error::{DomainError, Result};

/// Address fields as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressDraft {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub address_type: AddressType,
    pub is_default: bool,
}

impl AddressDraft {
    /// Trims every field and checks that the required ones are present.
    pub fn validate(self) -> Result<(AddressFields, bool)> {
        let required = [
            ("fullName", &self.full_name),
            ("phone", &self.phone),
            ("addressLine1", &self.address_line1),
            ("city", &self.city),
            ("state", &self.state),
            ("pincode", &self.pincode),
        ];
        let missing: Vec<_> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::validation(format!(
                "Required fields missing: {}",
                missing.join(", ")
            )));
        }

        let fields = AddressFields {
            full_name: self.full_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            line1: self.address_line1.trim().to_string(),
            line2: self
                .address_line2
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            pincode: self.pincode.trim().to_string(),
            address_type: self.address_type,
        };
        Ok((fields, self.is_default))
    }
}

/// Manages a user's saved addresses.
///
/// The store runs every clear-then-set of the default flag as one unit, so a
/// concurrent reader sees either the old default or the new one.
#[derive(Clone)]
pub struct AddressService<S> {
    store: S,
}

impl<S: AddressStore> AddressService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists the user's addresses, default first.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>> {
        Ok(self.store.list_addresses(user_id).await?)
    }

    /// Creates an address. A first address is not made default automatically.
    #[tracing::instrument(skip(self, draft))]
    pub async fn create(&self, user_id: UserId, draft: AddressDraft) -> Result<Address> {
        let (fields, is_default) = draft.validate()?;
        let address = self.store.insert_address(user_id, fields, is_default).await?;
        if is_default {
            metrics::counter!("default_address_changes_total").increment(1);
        }
        tracing::info!(address_id = %address.id, is_default, "address created");
        Ok(address)
    }

    /// Replaces every field of an owned address.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update(
        &self,
        user_id: UserId,
        address_id: AddressId,
        draft: AddressDraft,
    ) -> Result<Address> {
        let (fields, is_default) = draft.validate()?;
        let address = self
            .store
            .update_address(user_id, address_id, fields, is_default)
            .await?
            .ok_or_else(|| DomainError::not_found("address", address_id))?;
        if is_default {
            metrics::counter!("default_address_changes_total").increment(1);
        }
        Ok(address)
    }

    /// Deletes an owned address. If it was the default, the user is left
    /// without one.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user_id: UserId, address_id: AddressId) -> Result<()> {
        if !self.store.delete_address(user_id, address_id).await? {
            return Err(DomainError::not_found("address", address_id));
        }
        Ok(())
    }

    /// Makes `address_id` the user's only default address.
    #[tracing::instrument(skip(self))]
    pub async fn set_default(&self, user_id: UserId, address_id: AddressId) -> Result<()> {
        if !self.store.set_default_address(user_id, address_id).await? {
            return Err(DomainError::not_found("address", address_id));
        }
        metrics::counter!("default_address_changes_total").increment(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use store::InMemoryStore;

    use super::*;

    fn draft(name: &str, is_default: bool) -> AddressDraft {
        AddressDraft {
            full_name: name.to_string(),
            phone: "9800000000".to_string(),
            address_line1: "12 MG Road".to_string(),
            address_line2: Some("   ".to_string()),
            city: "Bengaluru".to_string(),
            state: "KA".to_string(),
            pincode: "560001".to_string(),
            address_type: AddressType::Work,
            is_default,
        }
    }

    fn service() -> AddressService<InMemoryStore> {
        AddressService::new(InMemoryStore::new())
    }

    #[test]
    fn validate_lists_missing_fields() {
        let err = AddressDraft {
            full_name: "Asha".into(),
            city: " ".into(),
            ..AddressDraft::default()
        }
        .validate()
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Required fields missing: phone, addressLine1, city, state, pincode"
        );
    }

    #[test]
    fn validate_drops_blank_second_line() {
        let (fields, is_default) = draft("Asha", true).validate().unwrap();
        assert_eq!(fields.line2, None);
        assert_eq!(fields.address_type, AddressType::Work);
        assert!(is_default);
    }

    #[test]
    fn draft_uses_camel_case_and_defaults() {
        let draft: AddressDraft = serde_json::from_value(serde_json::json!({
            "fullName": "Asha",
            "phone": "1",
            "addressLine1": "x",
            "city": "y",
            "state": "z",
            "pincode": "1"
        }))
        .unwrap();
        assert_eq!(draft.address_type, AddressType::Home);
        assert!(!draft.is_default);
    }

    #[tokio::test]
    async fn first_address_is_not_forced_default() {
        let service = service();
        let address = service.create(UserId::new(1), draft("A", false)).await.unwrap();
        assert!(!address.is_default);
    }

    #[tokio::test]
    async fn set_default_switches_exactly_two_rows() {
        let service = service();
        let user = UserId::new(1);
        let a = service.create(user, draft("A", true)).await.unwrap();
        let b = service.create(user, draft("B", false)).await.unwrap();
        let c = service.create(user, draft("C", false)).await.unwrap();

        service.set_default(user, b.id).await.unwrap();

        let listed = service.list(user).await.unwrap();
        let flag = |id| listed.iter().find(|a| a.id == id).unwrap().is_default;
        assert!(!flag(a.id));
        assert!(flag(b.id));
        assert!(!flag(c.id));
        assert_eq!(listed[0].id, b.id);
    }

    #[tokio::test]
    async fn other_users_address_is_not_found() {
        let service = service();
        let a = service.create(UserId::new(1), draft("A", false)).await.unwrap();
        let intruder = UserId::new(2);

        for err in [
            service.set_default(intruder, a.id).await.unwrap_err(),
            service.delete(intruder, a.id).await.unwrap_err(),
            service
                .update(intruder, a.id, draft("X", true))
                .await
                .unwrap_err(),
        ] {
            assert!(matches!(
                err,
                DomainError::NotFound {
                    resource: "address",
                    ..
                }
            ));
        }
    }

    #[tokio::test]
    async fn update_without_default_flag_clears_it() {
        let service = service();
        let user = UserId::new(1);
        let a = service.create(user, draft("A", true)).await.unwrap();

        let updated = service.update(user, a.id, draft("A2", false)).await.unwrap();

        assert_eq!(updated.full_name, "A2");
        assert!(!updated.is_default);
    }

    #[tokio::test]
    async fn deleting_default_leaves_no_default() {
        let service = service();
        let user = UserId::new(1);
        let a = service.create(user, draft("A", true)).await.unwrap();
        service.create(user, draft("B", false)).await.unwrap();

        service.delete(user, a.id).await.unwrap();

        let listed = service.list(user).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed.iter().all(|a| !a.is_default));
    }
}
