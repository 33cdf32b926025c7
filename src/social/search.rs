//! Bounded-degree cardholder search
//!
//! Walks at most two hops from the requester: every friend, then every friend
//! of each friend (skipping the requester). Matches are reported in traversal
//! order. A holder reachable through several friends appears once per path,
//! each row naming the connecting friend.

use super::error::{SocialError, SocialResult};
use super::models::{CardholderResults, FirstDegreeMatch, SecondDegreeMatch};
use crate::neo4j::models::{CardId, CardObjectType, UserNode};
use crate::neo4j::SocialStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Read-only traversal over the friendship graph
pub struct CardholderSearch {
    store: Arc<dyn SocialStore>,
}

/// Per-search memo so each user and card set is fetched once
#[derive(Default)]
struct Lookups {
    users: HashMap<Uuid, Option<(UserNode, HashSet<CardId>)>>,
}

impl CardholderSearch {
    pub fn new(store: Arc<dyn SocialStore>) -> Self {
        Self { store }
    }

    /// Find who within two hops of `actor` holds `card_id` (or any card of a tag)
    pub async fn search(&self, actor: Uuid, card_id: CardId) -> SocialResult<CardholderResults> {
        let card = self
            .store
            .get_card(card_id)
            .await?
            .ok_or_else(|| SocialError::invalid(format!("unknown card {}", card_id)))?;

        // Tag cards stand for every card grouped under them
        let targets: Vec<(CardId, String)> = match card.object_type {
            CardObjectType::Tag => {
                let mut targets = Vec::new();
                for id in self.store.list_card_ids_by_tag(card.id).await? {
                    if let Some(member) = self.store.get_card(id).await? {
                        targets.push((member.id, member.name));
                    }
                }
                targets
            }
            CardObjectType::Card => vec![(card.id, card.name)],
        };

        let mut results = CardholderResults::default();
        if targets.is_empty() {
            return Ok(results);
        }

        let mut lookups = Lookups::default();

        for edge in self.store.list_friend_edges(actor).await? {
            let Some((friend, friend_cards)) = self.user(&mut lookups, edge.friend_id).await?
            else {
                warn!(friend_id = %edge.friend_id, "No friend with id");
                continue;
            };

            for (target_id, target_name) in &targets {
                if friend_cards.contains(target_id) {
                    results.first.push(FirstDegreeMatch {
                        name: friend.name.clone(),
                        id: friend.id,
                        phone_number: friend.phone_number.clone(),
                        card_id: *target_id,
                        card_name: target_name.clone(),
                    });
                }
            }

            for second_edge in self.store.list_friend_edges(friend.id).await? {
                if second_edge.friend_id == actor {
                    continue;
                }
                let Some((holder, holder_cards)) =
                    self.user(&mut lookups, second_edge.friend_id).await?
                else {
                    warn!(friend_id = %second_edge.friend_id, "No second degree friend with id");
                    continue;
                };

                for (target_id, target_name) in &targets {
                    if holder_cards.contains(target_id) {
                        results.second.push(SecondDegreeMatch {
                            name: holder.name.clone(),
                            id: holder.id,
                            card_id: *target_id,
                            card_name: target_name.clone(),
                            friend_name: friend.name.clone(),
                        });
                    }
                }
            }
        }

        results.num_first = results.first.len();
        results.num_second = results.second.len();
        debug!(
            actor = %actor,
            card_id,
            first = results.num_first,
            second = results.num_second,
            "Cardholder search complete"
        );
        Ok(results)
    }

    async fn user(
        &self,
        lookups: &mut Lookups,
        id: Uuid,
    ) -> SocialResult<Option<(UserNode, HashSet<CardId>)>> {
        if let Some(cached) = lookups.users.get(&id) {
            return Ok(cached.clone());
        }
        let entry = match self.store.get_user(id).await? {
            Some(user) => {
                let cards = self.store.get_user_card_ids(id).await?.into_iter().collect();
                Some((user, cards))
            }
            None => None,
        };
        lookups.users.insert(id, entry.clone());
        Ok(entry)
    }
}
