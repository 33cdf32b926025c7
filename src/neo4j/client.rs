//! Neo4j client for the social graph
//!
//! Users, cards, requests and posts are nodes; friendships are pairs of
//! `FRIEND` relationships and card ownership is an `OWNS` relationship
//! (one per user/card, enforced with `MERGE`).

use super::models::*;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use neo4rs::{query, Graph, Query};
use std::sync::Arc;
use uuid::Uuid;

/// Client for Neo4j operations
pub struct Neo4jClient {
    graph: Arc<Graph>,
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse()
        .with_context(|| format!("invalid stored timestamp {:?}", raw))
}

/// Optional timestamps are stored as `''` when unset
fn parse_optional_time(raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.filter(|s| !s.is_empty())
        .map(|s| parse_time(&s))
        .transpose()
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.is_empty())
}

impl Neo4jClient {
    /// Create a new Neo4j client
    pub async fn new(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .context("Failed to connect to Neo4j")?;

        let client = Self {
            graph: Arc::new(graph),
        };

        client.init_schema().await?;

        Ok(client)
    }

    /// Initialize the graph schema with constraints and indexes
    async fn init_schema(&self) -> Result<()> {
        let constraints = vec![
            "CREATE CONSTRAINT user_id IF NOT EXISTS FOR (u:User) REQUIRE u.id IS UNIQUE",
            "CREATE CONSTRAINT user_id_code IF NOT EXISTS FOR (u:User) REQUIRE u.id_code IS UNIQUE",
            "CREATE CONSTRAINT user_phone IF NOT EXISTS FOR (u:User) REQUIRE u.phone_number IS UNIQUE",
            "CREATE CONSTRAINT card_id IF NOT EXISTS FOR (c:Card) REQUIRE c.id IS UNIQUE",
            "CREATE CONSTRAINT friend_request_id IF NOT EXISTS FOR (r:FriendRequest) REQUIRE r.id IS UNIQUE",
            // At most one request per unordered user pair
            "CREATE CONSTRAINT friend_request_pair IF NOT EXISTS FOR (r:FriendRequest) REQUIRE r.pair_key IS UNIQUE",
            "CREATE CONSTRAINT access_request_id IF NOT EXISTS FOR (r:AccessRequest) REQUIRE r.id IS UNIQUE",
            "CREATE CONSTRAINT post_id IF NOT EXISTS FOR (p:Post) REQUIRE p.id IS UNIQUE",
        ];

        let indexes = vec![
            "CREATE INDEX card_tag IF NOT EXISTS FOR (c:Card) ON (c.tag_id)",
            "CREATE INDEX card_object_type IF NOT EXISTS FOR (c:Card) ON (c.object_type)",
            "CREATE INDEX friend_request_from IF NOT EXISTS FOR (r:FriendRequest) ON (r.from_user_id)",
            "CREATE INDEX friend_request_to IF NOT EXISTS FOR (r:FriendRequest) ON (r.to_user_id)",
            "CREATE INDEX access_request_from IF NOT EXISTS FOR (r:AccessRequest) ON (r.from_user_id)",
            "CREATE INDEX access_request_to IF NOT EXISTS FOR (r:AccessRequest) ON (r.to_user_id)",
            "CREATE INDEX post_creator IF NOT EXISTS FOR (p:Post) ON (p.creator_id)",
        ];

        for constraint in constraints {
            if let Err(e) = self.graph.run(query(constraint)).await {
                tracing::warn!("Constraint may already exist: {}", e);
            }
        }

        for index in indexes {
            if let Err(e) = self.graph.run(query(index)).await {
                tracing::warn!("Index may already exist: {}", e);
            }
        }

        Ok(())
    }

    /// Execute a parameterized Cypher query (internal use only)
    pub(crate) async fn execute_with_params(&self, q: Query) -> Result<Vec<neo4rs::Row>> {
        let mut result = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Check connectivity with a trivial query
    pub async fn health_check(&self) -> Result<bool> {
        let rows = self.execute_with_params(query("RETURN 1 AS ok")).await?;
        Ok(!rows.is_empty())
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn create_user(&self, user: &UserNode) -> Result<()> {
        let q = query(
            r#"
            CREATE (u:User {
                id: $id,
                id_code: $id_code,
                name: $name,
                phone_number: $phone_number,
                notification_address: $notification_address,
                upi_id: $upi_id,
                profile_img_url: $profile_img_url,
                suspended: $suspended,
                joined: $joined
            })
            "#,
        )
        .param("id", user.id.to_string())
        .param("id_code", user.id_code.to_uppercase())
        .param("name", user.name.clone())
        .param("phone_number", user.phone_number.clone())
        .param(
            "notification_address",
            user.notification_address.clone().unwrap_or_default(),
        )
        .param("upi_id", user.upi_id.clone().unwrap_or_default())
        .param(
            "profile_img_url",
            user.profile_img_url.clone().unwrap_or_default(),
        )
        .param("suspended", user.suspended)
        .param("joined", user.joined.to_rfc3339());

        self.graph.run(q).await?;
        Ok(())
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<UserNode>> {
        let q = query("MATCH (u:User {id: $id}) RETURN u").param("id", id.to_string());
        self.single_user(q).await
    }

    pub async fn get_user_by_id_code(&self, id_code: &str) -> Result<Option<UserNode>> {
        let q = query("MATCH (u:User {id_code: $id_code}) RETURN u")
            .param("id_code", id_code.to_uppercase());
        self.single_user(q).await
    }

    async fn single_user(&self, q: Query) -> Result<Option<UserNode>> {
        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("u")?;
            Ok(Some(self.node_to_user(&node)?))
        } else {
            Ok(None)
        }
    }

    pub async fn update_user_upi(&self, id: Uuid, upi_id: &str) -> Result<()> {
        let q = query("MATCH (u:User {id: $id}) SET u.upi_id = $upi_id")
            .param("id", id.to_string())
            .param("upi_id", upi_id);
        self.graph.run(q).await?;
        Ok(())
    }

    pub async fn get_user_card_ids(&self, user_id: Uuid) -> Result<Vec<CardId>> {
        let q = query(
            r#"
            MATCH (:User {id: $id})-[:OWNS]->(c:Card)
            RETURN DISTINCT c.id AS card_id
            ORDER BY card_id
            "#,
        )
        .param("id", user_id.to_string());

        let rows = self.execute_with_params(q).await?;
        rows.iter()
            .map(|row| row.get::<i64>("card_id").map_err(Into::into))
            .collect()
    }

    pub async fn replace_user_cards(&self, user_id: Uuid, card_ids: &[CardId]) -> Result<()> {
        // One statement: drop every link, then MERGE the new set
        let q = query(
            r#"
            MATCH (u:User {id: $id})
            OPTIONAL MATCH (u)-[old:OWNS]->(:Card)
            DELETE old
            WITH DISTINCT u
            UNWIND $card_ids AS card_id
            MATCH (c:Card {id: card_id})
            MERGE (u)-[:OWNS]->(c)
            "#,
        )
        .param("id", user_id.to_string())
        .param("card_ids", card_ids.to_vec());

        self.graph.run(q).await?;
        Ok(())
    }

    pub async fn delete_user_cascade(&self, user_id: Uuid) -> Result<Option<UserPurgeSummary>> {
        let id = user_id.to_string();

        let count_q = query(
            r#"
            MATCH (u:User {id: $id})
            OPTIONAL MATCH (u)-[e:FRIEND]-(:User)
            WITH u, count(DISTINCT e) AS friend_edges
            OPTIONAL MATCH (fr:FriendRequest)
                WHERE fr.from_user_id = $id OR fr.to_user_id = $id
            WITH u, friend_edges, count(DISTINCT fr) AS friend_requests
            OPTIONAL MATCH (ar:AccessRequest)
                WHERE ar.from_user_id = $id OR ar.to_user_id = $id
            WITH u, friend_edges, friend_requests, count(DISTINCT ar) AS access_requests
            OPTIONAL MATCH (p:Post {creator_id: $id})
            WITH u, friend_edges, friend_requests, access_requests, count(DISTINCT p) AS posts
            OPTIONAL MATCH (u)-[o:OWNS]->(:Card)
            RETURN friend_edges, friend_requests, access_requests, posts,
                   count(DISTINCT o) AS card_links
            "#,
        )
        .param("id", id.clone());

        let rows = self.execute_with_params(count_q).await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let summary = UserPurgeSummary {
            friend_edges: row.get::<i64>("friend_edges")? as usize,
            friend_requests: row.get::<i64>("friend_requests")? as usize,
            access_requests: row.get::<i64>("access_requests")? as usize,
            posts: row.get::<i64>("posts")? as usize,
            card_links: row.get::<i64>("card_links")? as usize,
        };

        let steps = vec![
            query("MATCH (:User {id: $id})-[e:FRIEND]-(:User) DELETE e").param("id", id.clone()),
            query(
                "MATCH (r:FriendRequest) WHERE r.from_user_id = $id OR r.to_user_id = $id DELETE r",
            )
            .param("id", id.clone()),
            query(
                "MATCH (r:AccessRequest) WHERE r.from_user_id = $id OR r.to_user_id = $id DELETE r",
            )
            .param("id", id.clone()),
            query("MATCH (p:Post {creator_id: $id}) DELETE p").param("id", id.clone()),
            query("MATCH (:User {id: $id})-[o:OWNS]->(:Card) DELETE o").param("id", id.clone()),
            query("MATCH (u:User {id: $id}) DETACH DELETE u").param("id", id),
        ];

        let mut txn = self.graph.start_txn().await?;
        if let Err(e) = txn.run_queries(steps).await {
            txn.rollback().await.ok();
            return Err(e).context("Failed to purge user");
        }
        txn.commit().await?;

        Ok(Some(summary))
    }

    fn node_to_user(&self, node: &neo4rs::Node) -> Result<UserNode> {
        Ok(UserNode {
            id: node.get::<String>("id")?.parse()?,
            id_code: node.get("id_code")?,
            name: node.get("name")?,
            phone_number: node.get("phone_number").unwrap_or_default(),
            notification_address: non_empty(node.get("notification_address").ok()),
            upi_id: non_empty(node.get("upi_id").ok()),
            profile_img_url: non_empty(node.get("profile_img_url").ok()),
            suspended: node.get("suspended").unwrap_or(false),
            joined: parse_time(&node.get::<String>("joined")?)?,
        })
    }

    // ========================================================================
    // Cards
    // ========================================================================

    pub async fn create_card(&self, card: &CardNode) -> Result<()> {
        let q = query(
            r#"
            MERGE (c:Card {id: $id})
            SET c.name = $name, c.tag_id = $tag_id, c.object_type = $object_type
            "#,
        )
        .param("id", card.id)
        .param("name", card.name.clone())
        .param("tag_id", card.tag_id.unwrap_or(-1))
        .param("object_type", card.object_type.as_str());

        self.graph.run(q).await?;
        Ok(())
    }

    pub async fn get_card(&self, id: CardId) -> Result<Option<CardNode>> {
        let q = query("MATCH (c:Card {id: $id}) RETURN c").param("id", id);
        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("c")?;
            Ok(Some(self.node_to_card(&node)?))
        } else {
            Ok(None)
        }
    }

    pub async fn list_cards(&self) -> Result<Vec<CardNode>> {
        self.cards_from(query("MATCH (c:Card) RETURN c ORDER BY c.id"))
            .await
    }

    pub async fn list_cards_by_type(&self, object_type: CardObjectType) -> Result<Vec<CardNode>> {
        let q = query("MATCH (c:Card {object_type: $object_type}) RETURN c ORDER BY c.id")
            .param("object_type", object_type.as_str());
        self.cards_from(q).await
    }

    pub async fn list_card_ids_by_tag(&self, tag_id: CardId) -> Result<Vec<CardId>> {
        let q = query("MATCH (c:Card {tag_id: $tag_id}) RETURN c.id AS id ORDER BY id")
            .param("tag_id", tag_id);
        let rows = self.execute_with_params(q).await?;
        rows.iter()
            .map(|row| row.get::<i64>("id").map_err(Into::into))
            .collect()
    }

    async fn cards_from(&self, q: Query) -> Result<Vec<CardNode>> {
        let mut result = self.graph.execute(q).await?;
        let mut cards = Vec::new();
        while let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("c")?;
            cards.push(self.node_to_card(&node)?);
        }
        Ok(cards)
    }

    fn node_to_card(&self, node: &neo4rs::Node) -> Result<CardNode> {
        let object_type = node
            .get::<String>("object_type")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(CardObjectType::Card);
        Ok(CardNode {
            id: node.get("id")?,
            name: node.get("name")?,
            tag_id: node.get::<i64>("tag_id").ok().filter(|&t| t >= 0),
            object_type,
        })
    }

    // ========================================================================
    // Friend graph
    // ========================================================================

    pub async fn list_friend_edges(&self, user_id: Uuid) -> Result<Vec<FriendEdge>> {
        let q = query(
            r#"
            MATCH (u:User {id: $id})-[e:FRIEND]->(f:User)
            RETURN u.id AS owner_id, f.id AS friend_id,
                   e.request_id AS request_id, e.started_on AS started_on
            ORDER BY e.started_on, f.id
            "#,
        )
        .param("id", user_id.to_string());

        let rows = self.execute_with_params(q).await?;
        rows.iter().map(|row| self.row_to_edge(row)).collect()
    }

    pub async fn get_friend_edge(
        &self,
        owner_id: Uuid,
        friend_id: Uuid,
    ) -> Result<Option<FriendEdge>> {
        let q = query(
            r#"
            MATCH (u:User {id: $owner})-[e:FRIEND]->(f:User {id: $friend})
            RETURN u.id AS owner_id, f.id AS friend_id,
                   e.request_id AS request_id, e.started_on AS started_on
            "#,
        )
        .param("owner", owner_id.to_string())
        .param("friend", friend_id.to_string());

        let rows = self.execute_with_params(q).await?;
        rows.first().map(|row| self.row_to_edge(row)).transpose()
    }

    pub async fn count_friends(&self, user_id: Uuid) -> Result<usize> {
        let q = query(
            "MATCH (:User {id: $id})-[:FRIEND]->(f:User) RETURN count(DISTINCT f) AS total",
        )
        .param("id", user_id.to_string());
        let rows = self.execute_with_params(q).await?;
        let total = rows
            .first()
            .map(|row| row.get::<i64>("total"))
            .transpose()?
            .unwrap_or(0);
        Ok(total as usize)
    }

    pub async fn remove_friend_pair(
        &self,
        owner_id: Uuid,
        friend_id: Uuid,
    ) -> Result<Option<RemovedFriendship>> {
        // Single statement: both edge directions and the request go together
        let q = query(
            r#"
            MATCH (a:User {id: $owner})-[e:FRIEND]->(b:User {id: $friend})
            WITH a, b, e, e.request_id AS request_id, e.started_on AS started_on
            OPTIONAL MATCH (b)-[back:FRIEND]->(a)
            OPTIONAL MATCH (r:FriendRequest {id: request_id})
            WITH e, back, r, request_id, started_on, r IS NOT NULL AS request_deleted
            DELETE e, back, r
            RETURN request_id, started_on, request_deleted
            "#,
        )
        .param("owner", owner_id.to_string())
        .param("friend", friend_id.to_string());

        let rows = self.execute_with_params(q).await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };

        Ok(Some(RemovedFriendship {
            edge: FriendEdge {
                owner_id,
                friend_id,
                request_id: row.get::<String>("request_id")?.parse()?,
                started_on: parse_time(&row.get::<String>("started_on")?)?,
            },
            request_deleted: row.get("request_deleted")?,
        }))
    }

    fn row_to_edge(&self, row: &neo4rs::Row) -> Result<FriendEdge> {
        Ok(FriendEdge {
            owner_id: row.get::<String>("owner_id")?.parse()?,
            friend_id: row.get::<String>("friend_id")?.parse()?,
            request_id: row.get::<String>("request_id")?.parse()?,
            started_on: parse_time(&row.get::<String>("started_on")?)?,
        })
    }

    // ========================================================================
    // Friend requests
    // ========================================================================

    pub async fn create_friend_request(&self, request: &FriendRequestNode) -> Result<bool> {
        // MERGE on the unique pair key serialises concurrent creates for a pair
        let q = query(
            r#"
            MERGE (r:FriendRequest {pair_key: $pair_key})
            ON CREATE SET r.id = $id,
                          r.from_user_id = $from_user_id,
                          r.to_user_id = $to_user_id,
                          r.created_on = $created_on,
                          r.resolved_on = '',
                          r.status = $status
            RETURN r.id = $id AS created
            "#,
        )
        .param("pair_key", request.pair_key())
        .param("id", request.id.to_string())
        .param("from_user_id", request.from_user_id.to_string())
        .param("to_user_id", request.to_user_id.to_string())
        .param("created_on", request.created_on.to_rfc3339())
        .param("status", request.status.code());

        let rows = self.execute_with_params(q).await?;
        Ok(rows
            .first()
            .map(|row| row.get::<bool>("created"))
            .transpose()?
            .unwrap_or(false))
    }

    pub async fn get_friend_request(&self, id: Uuid) -> Result<Option<FriendRequestNode>> {
        let q = query("MATCH (r:FriendRequest {id: $id}) RETURN r").param("id", id.to_string());
        Ok(self.friend_requests_from(q).await?.into_iter().next())
    }

    pub async fn delete_friend_request(
        &self,
        id: Uuid,
        expected: FriendRequestStatus,
    ) -> Result<StatusWrite> {
        let q = query(
            r#"
            MATCH (r:FriendRequest {id: $id})
            SET r._lock = true
            WITH r, r.status = $expected AS fresh
            FOREACH (_ IN CASE WHEN fresh THEN [] ELSE [1] END | REMOVE r._lock)
            FOREACH (_ IN CASE WHEN fresh THEN [1] ELSE [] END | DELETE r)
            RETURN fresh
            "#,
        )
        .param("id", id.to_string())
        .param("expected", expected.code());

        let rows = self.execute_with_params(q).await?;
        let fresh = rows
            .first()
            .map(|row| row.get::<bool>("fresh"))
            .transpose()?
            .unwrap_or(false);
        Ok(if fresh {
            StatusWrite::Applied
        } else {
            StatusWrite::Stale
        })
    }

    pub async fn list_friend_requests_sent(&self, user_id: Uuid) -> Result<Vec<FriendRequestNode>> {
        let q = query(
            "MATCH (r:FriendRequest {from_user_id: $id}) RETURN r ORDER BY r.created_on DESC",
        )
        .param("id", user_id.to_string());
        self.friend_requests_from(q).await
    }

    pub async fn list_friend_requests_received(
        &self,
        user_id: Uuid,
        status: Option<FriendRequestStatus>,
    ) -> Result<Vec<FriendRequestNode>> {
        let q = match status {
            Some(status) => query(
                r#"
                MATCH (r:FriendRequest {to_user_id: $id, status: $status})
                RETURN r ORDER BY r.created_on DESC
                "#,
            )
            .param("id", user_id.to_string())
            .param("status", status.code()),
            None => query(
                "MATCH (r:FriendRequest {to_user_id: $id}) RETURN r ORDER BY r.created_on DESC",
            )
            .param("id", user_id.to_string()),
        };
        self.friend_requests_from(q).await
    }

    pub async fn accept_friend_request(
        &self,
        id: Uuid,
        expected: FriendRequestStatus,
        limit: Option<u32>,
        resolved_on: DateTime<Utc>,
    ) -> Result<StatusWrite> {
        // The lock property takes the write locks on the request and the
        // recipient before the status and friend count are read.
        let q = query(
            r#"
            MATCH (r:FriendRequest {id: $id})
            MATCH (a:User {id: r.from_user_id}), (b:User {id: r.to_user_id})
            SET r._lock = true, b._lock = true
            WITH r, a, b
            OPTIONAL MATCH (b)-[:FRIEND]->(f:User)
            WITH r, a, b, count(DISTINCT f) AS current
            WITH r, a, b, current,
                 r.status = $expected AS fresh,
                 ($limit < 0 OR current < $limit) AS within
            FOREACH (_ IN CASE WHEN fresh AND within THEN [1] ELSE [] END |
                SET r.status = $status, r.resolved_on = $resolved_on
                MERGE (a)-[ab:FRIEND]->(b)
                    ON CREATE SET ab.request_id = $id, ab.started_on = $resolved_on
                MERGE (b)-[ba:FRIEND]->(a)
                    ON CREATE SET ba.request_id = $id, ba.started_on = $resolved_on
            )
            REMOVE r._lock, b._lock
            RETURN fresh, within, current
            "#,
        )
        .param("id", id.to_string())
        .param("expected", expected.code())
        .param("limit", limit.map_or(-1, i64::from))
        .param("status", FriendRequestStatus::Accepted.code())
        .param("resolved_on", resolved_on.to_rfc3339());

        let rows = self.execute_with_params(q).await?;
        let row = rows
            .first()
            .with_context(|| format!("friend request {} or its participants not found", id))?;

        if !row.get::<bool>("fresh")? {
            return Ok(StatusWrite::Stale);
        }
        if !row.get::<bool>("within")? {
            let current: i64 = row.get("current")?;
            return Ok(StatusWrite::LimitReached {
                current: current as usize,
            });
        }
        Ok(StatusWrite::Applied)
    }

    pub async fn decline_friend_request(
        &self,
        id: Uuid,
        expected: FriendRequestStatus,
        resolved_on: DateTime<Utc>,
    ) -> Result<StatusWrite> {
        let q = query(
            r#"
            MATCH (r:FriendRequest {id: $id})
            SET r._lock = true
            WITH r, r.status = $expected AS fresh
            FOREACH (_ IN CASE WHEN fresh THEN [1] ELSE [] END |
                SET r.status = $status, r.resolved_on = $resolved_on
            )
            REMOVE r._lock
            WITH r, fresh
            OPTIONAL MATCH (:User)-[e:FRIEND {request_id: $id}]->(:User)
            WHERE fresh
            DELETE e
            RETURN DISTINCT fresh
            "#,
        )
        .param("id", id.to_string())
        .param("expected", expected.code())
        .param("status", FriendRequestStatus::Declined.code())
        .param("resolved_on", resolved_on.to_rfc3339());

        let rows = self.execute_with_params(q).await?;
        let row = rows
            .first()
            .with_context(|| format!("friend request {} not found", id))?;
        Ok(if row.get::<bool>("fresh")? {
            StatusWrite::Applied
        } else {
            StatusWrite::Stale
        })
    }

    async fn friend_requests_from(&self, q: Query) -> Result<Vec<FriendRequestNode>> {
        let mut result = self.graph.execute(q).await?;
        let mut requests = Vec::new();
        while let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("r")?;
            requests.push(self.node_to_friend_request(&node)?);
        }
        Ok(requests)
    }

    fn node_to_friend_request(&self, node: &neo4rs::Node) -> Result<FriendRequestNode> {
        let code: i64 = node.get("status")?;
        Ok(FriendRequestNode {
            id: node.get::<String>("id")?.parse()?,
            from_user_id: node.get::<String>("from_user_id")?.parse()?,
            to_user_id: node.get::<String>("to_user_id")?.parse()?,
            created_on: parse_time(&node.get::<String>("created_on")?)?,
            resolved_on: parse_optional_time(node.get("resolved_on").ok())?,
            status: FriendRequestStatus::from_code(code)
                .with_context(|| format!("unknown friend request status {}", code))?,
        })
    }

    // ========================================================================
    // Access requests
    // ========================================================================

    pub async fn create_access_request(&self, request: &AccessRequestNode) -> Result<()> {
        let q = query(
            r#"
            CREATE (r:AccessRequest {
                id: $id,
                from_user_id: $from_user_id,
                to_user_id: $to_user_id,
                card_id: $card_id,
                amount: $amount,
                short_desc: $short_desc,
                status: $status,
                created_on: $created_on,
                resolved_on: ''
            })
            "#,
        )
        .param("id", request.id.to_string())
        .param("from_user_id", request.from_user_id.to_string())
        .param("to_user_id", request.to_user_id.to_string())
        .param("card_id", request.card_id)
        .param("amount", request.amount)
        .param("short_desc", request.short_desc.clone().unwrap_or_default())
        .param("status", request.status.code())
        .param("created_on", request.created_on.to_rfc3339());

        self.graph.run(q).await?;
        Ok(())
    }

    pub async fn get_access_request(&self, id: Uuid) -> Result<Option<AccessRequestNode>> {
        let q = query("MATCH (r:AccessRequest {id: $id}) RETURN r").param("id", id.to_string());
        Ok(self.access_requests_from(q).await?.into_iter().next())
    }

    pub async fn update_access_request_status(
        &self,
        id: Uuid,
        expected: AccessRequestStatus,
        status: AccessRequestStatus,
        resolved_on: DateTime<Utc>,
    ) -> Result<StatusWrite> {
        let q = query(
            r#"
            MATCH (r:AccessRequest {id: $id})
            SET r._lock = true
            WITH r, r.status = $expected AS fresh
            FOREACH (_ IN CASE WHEN fresh THEN [1] ELSE [] END |
                SET r.status = $status, r.resolved_on = $resolved_on
            )
            REMOVE r._lock
            RETURN fresh
            "#,
        )
        .param("id", id.to_string())
        .param("expected", expected.code())
        .param("status", status.code())
        .param("resolved_on", resolved_on.to_rfc3339());

        let rows = self.execute_with_params(q).await?;
        let row = rows
            .first()
            .with_context(|| format!("access request {} not found", id))?;
        Ok(if row.get::<bool>("fresh")? {
            StatusWrite::Applied
        } else {
            StatusWrite::Stale
        })
    }

    pub async fn list_access_requests_sent(&self, user_id: Uuid) -> Result<Vec<AccessRequestNode>> {
        let q = query(
            "MATCH (r:AccessRequest {from_user_id: $id}) RETURN r ORDER BY r.created_on DESC",
        )
        .param("id", user_id.to_string());
        self.access_requests_from(q).await
    }

    pub async fn list_access_requests_received(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AccessRequestNode>> {
        let q = query(
            "MATCH (r:AccessRequest {to_user_id: $id}) RETURN r ORDER BY r.created_on DESC",
        )
        .param("id", user_id.to_string());
        self.access_requests_from(q).await
    }

    async fn access_requests_from(&self, q: Query) -> Result<Vec<AccessRequestNode>> {
        let mut result = self.graph.execute(q).await?;
        let mut requests = Vec::new();
        while let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("r")?;
            requests.push(self.node_to_access_request(&node)?);
        }
        Ok(requests)
    }

    fn node_to_access_request(&self, node: &neo4rs::Node) -> Result<AccessRequestNode> {
        let code: i64 = node.get("status")?;
        Ok(AccessRequestNode {
            id: node.get::<String>("id")?.parse()?,
            from_user_id: node.get::<String>("from_user_id")?.parse()?,
            to_user_id: node.get::<String>("to_user_id")?.parse()?,
            card_id: node.get("card_id")?,
            amount: node.get("amount")?,
            short_desc: non_empty(node.get("short_desc").ok()),
            status: AccessRequestStatus::from_code(code)
                .with_context(|| format!("unknown access request status {}", code))?,
            created_on: parse_time(&node.get::<String>("created_on")?)?,
            resolved_on: parse_optional_time(node.get("resolved_on").ok())?,
        })
    }

    // ========================================================================
    // Posts
    // ========================================================================

    pub async fn create_post(&self, post: &PostNode) -> Result<()> {
        let q = query(
            r#"
            CREATE (p:Post {
                id: $id,
                creator_id: $creator_id,
                text: $text,
                created_on: $created_on
            })
            "#,
        )
        .param("id", post.id.to_string())
        .param("creator_id", post.creator_id.to_string())
        .param("text", post.text.clone())
        .param("created_on", post.created_on.to_rfc3339());

        self.graph.run(q).await?;
        Ok(())
    }

    pub async fn get_post(&self, id: Uuid) -> Result<Option<PostNode>> {
        let q = query("MATCH (p:Post {id: $id}) RETURN p").param("id", id.to_string());
        Ok(self.posts_from(q).await?.into_iter().next())
    }

    pub async fn list_posts_by_creator(&self, creator_id: Uuid) -> Result<Vec<PostNode>> {
        let q = query("MATCH (p:Post {creator_id: $id}) RETURN p ORDER BY p.created_on DESC")
            .param("id", creator_id.to_string());
        self.posts_from(q).await
    }

    async fn posts_from(&self, q: Query) -> Result<Vec<PostNode>> {
        let mut result = self.graph.execute(q).await?;
        let mut posts = Vec::new();
        while let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("p")?;
            posts.push(PostNode {
                id: node.get::<String>("id")?.parse()?,
                creator_id: node.get::<String>("creator_id")?.parse()?,
                text: node.get("text")?,
                created_on: parse_time(&node.get::<String>("created_on")?)?,
            });
        }
        Ok(posts)
    }
}
