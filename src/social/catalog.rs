//! Read-only access to the card catalog

use super::error::SocialResult;
use crate::neo4j::models::{CardNode, CardObjectType};
use crate::neo4j::SocialStore;
use std::sync::Arc;

pub struct CardCatalog {
    store: Arc<dyn SocialStore>,
}

impl CardCatalog {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    pub async fn list_cards(&self) -> SocialResult<Vec<CardNode>> {
        Ok(self.store.list_cards().await?)
    }

    pub async fn list_by_type(&self, object_type: CardObjectType) -> SocialResult<Vec<CardNode>> {
        Ok(self.store.list_cards_by_type(object_type).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neo4j::mock::MockSocialStore;
    use crate::test_helpers::{test_card, test_tag};

    #[tokio::test]
    async fn test_list_and_filter() {
        let store = MockSocialStore::new()
            .with_card(test_card(2, "Gold"))
            .await
            .with_card(test_tag(1, "Travel"))
            .await
            .with_card(test_card(3, "Lounge"))
            .await;
        let catalog = CardCatalog::new(Arc::new(store));

        let ids: Vec<_> = catalog
            .list_cards()
            .await
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let tags = catalog.list_by_type(CardObjectType::Tag).await.unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "Travel");
    }
}
