//! Shipment tracking
//!
//! Queries the tracking provider's GraphQL endpoint and folds the result into
//! every order carrying the same carrier id and tracking number.

use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, instrument};

use haru_db::OrderRepository;

use crate::error::EventsError;

const TRACK_QUERY: &str = r#"
query Track($carrierId: ID!, $trackingNumber: String!) {
  track(carrierId: $carrierId, trackingNumber: $trackingNumber) {
    lastEvent {
      time
      status { name }
      description
    }
    events(last: 20) {
      edges {
        node {
          time
          status { name }
          description
        }
      }
    }
  }
}
"#;

/// One tracking event as persisted on the order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingEvent {
    /// Event timestamp as the provider reports it
    pub time: String,
    /// Status name (e.g. "In Transit", "Delivered")
    pub status: String,
    /// Free-form description, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Normalized tracking result
#[derive(Debug, Clone)]
pub struct TrackingInfo {
    /// Latest status name
    pub status: String,
    /// Event history, oldest first
    pub events: Vec<TrackingEvent>,
}

/// Tracking provider client
#[derive(Clone)]
pub struct TrackingClient {
    client: Client,
    endpoint: String,
}

impl TrackingClient {
    /// Create a new tracking client
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Query the provider for a shipment's current state.
    #[instrument(skip(self))]
    pub async fn track(
        &self,
        carrier_id: &str,
        tracking_number: &str,
    ) -> Result<TrackingInfo, EventsError> {
        debug!("Querying tracking provider");

        let body = json!({
            "query": TRACK_QUERY,
            "variables": {
                "carrierId": carrier_id,
                "trackingNumber": tracking_number,
            },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Tracking request failed");
                EventsError::Provider(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            error!(status = %status, "Tracking API error");
            return Err(EventsError::Provider(format!("tracking API error: {status}")));
        }

        let parsed: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| EventsError::Provider(e.to_string()))?;

        if let Some(errors) = parsed.errors {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(EventsError::Tracking(messages.join("; ")));
        }

        let track = parsed
            .data
            .and_then(|d| d.track)
            .ok_or_else(|| EventsError::Tracking("no track data".to_string()))?;

        let status = track
            .last_event
            .as_ref()
            .map(|e| e.status.name.clone())
            .unwrap_or_else(|| "unknown".to_string());

        let events = track
            .events
            .map(|conn| {
                conn.edges
                    .into_iter()
                    .map(|edge| TrackingEvent {
                        time: edge.node.time,
                        status: edge.node.status.name,
                        description: edge.node.description,
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(TrackingInfo { status, events })
    }
}

/// Applies tracking results to the order collection
pub struct OrderTracker<O: OrderRepository> {
    tracking: TrackingClient,
    orders: Arc<O>,
}

impl<O: OrderRepository> OrderTracker<O> {
    /// Create a new order tracker
    pub fn new(tracking: TrackingClient, orders: Arc<O>) -> Self {
        Self { tracking, orders }
    }

    /// Query the provider and update all matching orders.
    ///
    /// Silent no-op when no order carries the tracking number. Returns the
    /// number of orders updated.
    #[instrument(skip(self))]
    pub async fn update_orders(
        &self,
        carrier_id: &str,
        tracking_number: &str,
    ) -> Result<usize, EventsError> {
        let matching = self
            .orders
            .find_by_tracking(carrier_id, tracking_number)
            .await?;

        if matching.is_empty() {
            debug!("No orders match the tracking number");
            return Ok(0);
        }

        let info = self.tracking.track(carrier_id, tracking_number).await?;
        let events = serde_json::to_value(&info.events)
            .map_err(|e| EventsError::Internal(e.to_string()))?;

        let mut updated = 0;
        for order in &matching {
            updated += self
                .orders
                .update_delivery(order.id, &info.status, events.clone())
                .await? as usize;
        }

        info!(
            updated,
            status = %info.status,
            "Delivery status applied to orders"
        );

        Ok(updated)
    }
}

// GraphQL response shapes

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<TrackData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TrackData {
    track: Option<TrackNode>,
}

#[derive(Debug, Deserialize)]
struct TrackNode {
    #[serde(rename = "lastEvent")]
    last_event: Option<EventNode>,
    events: Option<EventConnection>,
}

#[derive(Debug, Deserialize)]
struct EventConnection {
    edges: Vec<EventEdge>,
}

#[derive(Debug, Deserialize)]
struct EventEdge {
    node: EventNode,
}

#[derive(Debug, Deserialize)]
struct EventNode {
    time: String,
    status: StatusNode,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusNode {
    name: String,
}
