//! ErrorDispatcher - turns failures into frames addressed to client sessions.
//!
//! Two entry points:
//!
//! - in-flow: a client frame failed and the protocol engine expects an ERROR
//!   frame back in the same turn ([`ErrorDispatcher::handle_client_message_processing_error`]);
//! - out-of-band: the failure surfaced elsewhere, so the frame is pushed onto
//!   the shared outbound channel ([`ErrorDispatcher::send_error_to_channel`]).
//!
//! Every dispatch is single-shot: classify, enrich, serialize, deliver.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::failure::{ClientContext, RelayFailure, ResponseEnricher, FAILED_STATUS};
use crate::domain::stomp::{headers, StompCommand, StompFrame};
use crate::ports::{ChannelError, OutboundChannel};

use super::safe_serializer::{SafeSerializer, SerializationError};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Errors from out-of-band dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("Failed to deliver error frame: {0}")]
    Channel(#[from] ChannelError),
}

/// Builds and routes client-visible error frames.
#[derive(Clone)]
pub struct ErrorDispatcher {
    serializer: SafeSerializer,
    outbound: Arc<dyn OutboundChannel>,
}

impl ErrorDispatcher {
    pub fn new(serializer: SafeSerializer, outbound: Arc<dyn OutboundChannel>) -> Self {
        Self {
            serializer,
            outbound,
        }
    }

    /// ERROR frame for a failure raised while processing `client`.
    ///
    /// The client's `receipt` becomes `receipt-id` and its session id is
    /// kept. Without a client frame the error carries no correlation.
    pub fn handle_client_message_processing_error(
        &self,
        client: Option<&StompFrame>,
        failure: &RelayFailure,
    ) -> Result<StompFrame, SerializationError> {
        // 1. Enrich the response from the failure and the client frame
        let response = ResponseEnricher::for_client_failure(failure, client);

        // 2. Build the ERROR frame with the client's correlation ids
        let mut frame = StompFrame::new(StompCommand::Error);
        if let Some(message) = failure.message() {
            frame.set_header(headers::MESSAGE, message);
        }
        if let Some(client) = client {
            let context = ClientContext::from_frame(client);
            if let Some(receipt) = context.receipt_id {
                frame.set_header(headers::RECEIPT_ID, receipt);
            }
            frame.session_id = context.session_id;
        }

        // 3. Attach the serialized payload
        frame.set_header(headers::CONTENT_TYPE, JSON_CONTENT_TYPE);
        frame.body = self.serializer.serialize(&response)?;

        tracing::debug!(
            session_id = ?frame.session_id,
            category = ?failure.category(),
            "Built in-flow error frame"
        );
        Ok(frame)
    }

    /// Rewrites an ERROR frame received from the broker before it reaches the client.
    ///
    /// The original body is carried as `data` of a default response; headers
    /// and session are kept.
    pub fn handle_error_message_to_client(
        &self,
        mut error_frame: StompFrame,
    ) -> Result<StompFrame, SerializationError> {
        let response = ResponseEnricher::for_broker_error(&error_frame);

        error_frame.set_header(headers::CONTENT_TYPE, JSON_CONTENT_TYPE);
        error_frame.body = self.serializer.serialize(&response)?;
        Ok(error_frame)
    }

    /// Pushes a frame describing `failure` onto the outbound channel.
    ///
    /// Attributable failures (access denied, validation) become ERROR frames;
    /// anything else becomes a MESSAGE frame with status `Failed` so the
    /// client's STOMP session survives. Without a session id the frame goes
    /// to every live session. Delivery is not retried.
    pub async fn send_error_to_channel(
        &self,
        context: Option<&ClientContext>,
        failure: &RelayFailure,
    ) -> Result<(), DispatchError> {
        // 1. Classify and enrich
        let mut response = ResponseEnricher::for_failure(failure, context);

        // 2. Pick the frame type
        let mut frame = if failure.category().is_attributable() {
            StompFrame::new(StompCommand::Error)
        } else {
            response.status = FAILED_STATUS.to_string();
            StompFrame::new(StompCommand::Message)
        };
        frame.set_header(headers::MESSAGE, response.message.clone());
        if let Some(context) = context {
            if let Some(receipt) = &context.receipt_id {
                frame.set_header(headers::RECEIPT_ID, receipt.clone());
            }
            frame.session_id = context.session_id.clone();
        }

        // 3. Serialize
        frame.set_header(headers::CONTENT_TYPE, JSON_CONTENT_TYPE);
        frame.body = self.serializer.serialize(&response)?;

        // 4. Deliver
        if frame.session_id.is_none() {
            let delivered = self.outbound.broadcast(frame).await;
            if delivered == 0 {
                tracing::warn!(
                    category = ?failure.category(),
                    "No live session to receive error frame"
                );
            }
            return Ok(());
        }

        let session_id = frame.session_id.clone();
        self.outbound.send(frame).await.map_err(|err| {
            tracing::error!(
                session_id = ?session_id,
                error = %err,
                "Failed to deliver error frame"
            );
            DispatchError::from(err)
        })
    }
}
