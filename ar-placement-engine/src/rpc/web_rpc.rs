use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::core::app_state::{ArSystemSet, SessionState};
use crate::engine::session::capability::{CapabilityProber, CheckSupport, SupportResult};
use crate::engine::session::session_manager::SessionCommand;
use crate::engine::systems::status_tracking::{
    self, ArUiStatus, DismissError, ErrorBanner,
};
use crate::tools::tool_manager::{CommandSource, PlacementAction, PlacementCommand};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC error structure following specification.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Resource managing bidirectional RPC communication between the page and Bevy.
/// Handles both request-response patterns and notification broadcasting.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the embedding page without expecting response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    /// Queue response for transmission to the embedding page.
    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }

    /// Notifications queued this tick, oldest first.
    pub fn queued_notifications(&self) -> &[RpcNotification] {
        &self.outgoing_notifications
    }
}

/// Plugin establishing WebRPC communication layer for iframe-based deployment.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (process_incoming_messages, handle_rpc_messages)
                    .chain()
                    .in_set(ArSystemSet::UiCommands),
            )
            .add_systems(
                Update,
                send_outgoing_messages
                    .in_set(ArSystemSet::Status)
                    .after(status_tracking::frame_stats_notification_system),
            );

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    // Thread-safe message queue for cross-thread communication.
    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        // Filter messages to ensure they contain string data.
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    if let Some(window) = window() {
        if let Err(e) =
            window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
        {
            error!("Failed to register message listener: {:?}", e);
        }
    }

    // Prevent closure from being dropped by transferring ownership to JS.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Resource wrapping thread-safe message queue for WASM event handling.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Raw RPC message from the embedding page.
#[derive(Event)]
pub struct IncomingRpcMessage {
    pub content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

/// Engine state visible to RPC handlers.
pub struct RpcContext<'a> {
    pub status: &'a ArUiStatus,
    pub support: Option<&'a SupportResult>,
    pub session_state: SessionState,
    pub banner: &'a ErrorBanner,
}

/// Commands produced while handling requests.
#[derive(Debug, Default, PartialEq)]
pub struct RpcEffects {
    pub session: Vec<SessionCommand>,
    pub placement: Vec<PlacementCommand>,
    pub check_support: bool,
    pub dismiss_error: bool,
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    status: Res<ArUiStatus>,
    prober: Res<CapabilityProber>,
    state: Res<State<SessionState>>,
    banner: Res<ErrorBanner>,
    mut session_events: EventWriter<SessionCommand>,
    mut placement_events: EventWriter<PlacementCommand>,
    mut support_events: EventWriter<CheckSupport>,
    mut dismiss_events: EventWriter<DismissError>,
) {
    let context = RpcContext {
        status: &status,
        support: prober.result(),
        session_state: *state.get(),
        banner: &banner,
    };
    let mut effects = RpcEffects::default();

    for event in events.read() {
        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                debug!("Processing RPC method: {}", request.method);
                if let Some(response) = handle_rpc_request(&request, &context, &mut effects) {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => {
                warn!("RPC parse error: {}", parse_error);
            }
        }
    }

    for command in effects.session {
        session_events.write(command);
    }
    for command in effects.placement {
        placement_events.write(command);
    }
    if effects.check_support {
        support_events.write(CheckSupport);
    }
    if effects.dismiss_error {
        dismiss_events.write(DismissError);
    }
}

/// Handle individual RPC request and generate response based on method.
///
/// Commands are collected into `effects`; requests without an ID still run
/// but produce no response.
pub fn handle_rpc_request(
    request: &RpcRequest,
    context: &RpcContext,
    effects: &mut RpcEffects,
) -> Option<RpcResponse> {
    let result = match request.method.as_str() {
        "check_support" => handle_check_support(context, effects),
        "start_session" => handle_session_command(SessionCommand::Start, context, effects),
        "exit" => handle_session_command(SessionCommand::Stop, context, effects),
        "place" => handle_placement(PlacementAction::Place, context, effects),
        "undo" => handle_placement(PlacementAction::UndoLast, context, effects),
        "clear" => handle_placement(PlacementAction::ClearAll, context, effects),
        "placement_action" => handle_placement_action(&request.params, context, effects),
        "get_status" => handle_get_status(context),
        "dismiss_error" => {
            effects.dismiss_error = true;
            Ok(serde_json::json!({ "success": true }))
        }
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            return request.id.clone().map(|id| {
                create_error_response(
                    id,
                    -32601,
                    "Method not found",
                    Some(serde_json::json!({"method": request.method})),
                )
            });
        }
    };

    // Only generate responses for requests with IDs (notifications have no ID).
    let id = request.id.clone()?;

    match result {
        Ok(result_value) => Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        }),
        Err(error) => Some(RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        }),
    }
}

/// Cached capability answer, or a fresh check whose result arrives as `ar_support`.
fn handle_check_support(
    context: &RpcContext,
    effects: &mut RpcEffects,
) -> Result<serde_json::Value, RpcError> {
    match context.support {
        Some(result) => serde_json::to_value(result)
            .map_err(|e| RpcError::internal_error(&e.to_string())),
        None => {
            effects.check_support = true;
            Ok(serde_json::json!({ "pending": true }))
        }
    }
}

fn handle_session_command(
    command: SessionCommand,
    context: &RpcContext,
    effects: &mut RpcEffects,
) -> Result<serde_json::Value, RpcError> {
    let accepted = match command {
        SessionCommand::Start => context.session_state == SessionState::Idle,
        SessionCommand::Stop => matches!(
            context.session_state,
            SessionState::Requesting | SessionState::Active
        ),
    };
    effects.session.push(command);

    Ok(serde_json::json!({
        "accepted": accepted,
        "state": context.session_state.as_str()
    }))
}

fn handle_placement(
    action: PlacementAction,
    context: &RpcContext,
    effects: &mut RpcEffects,
) -> Result<serde_json::Value, RpcError> {
    effects.placement.push(PlacementCommand {
        action,
        source: CommandSource::Rpc,
    });

    info!("Placement command dispatched via RPC: {}", action.to_string());

    Ok(serde_json::json!({
        "accepted": context.session_state == SessionState::Active,
        "action": action.to_string(),
        "placed_count": context.status.placed_count
    }))
}

/// Handle generic placement action RPC method with parameter validation.
fn handle_placement_action(
    params: &serde_json::Value,
    context: &RpcContext,
    effects: &mut RpcEffects,
) -> Result<serde_json::Value, RpcError> {
    #[derive(serde::Deserialize)]
    struct PlacementActionParams {
        action: String,
    }

    let action_params = serde_json::from_value::<PlacementActionParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'action' parameter"))?;

    let action = PlacementAction::from_string(&action_params.action).ok_or_else(|| {
        RpcError::invalid_params(&format!("Unknown action: {}", action_params.action))
    })?;

    handle_placement(action, context, effects)
}

fn handle_get_status(context: &RpcContext) -> Result<serde_json::Value, RpcError> {
    Ok(serde_json::json!({
        "tracking_state": context.status.tracking_state,
        "placed_count": context.status.placed_count,
        "ready": context.status.ready,
        "session_state": context.session_state.as_str(),
        "supported": context.support.map(|s| s.supported),
        "error": context.banner.message(),
    }))
}

/// Create standardized error response with optional data payload.
fn create_error_response(
    id: serde_json::Value,
    code: i32,
    message: &str,
    data: Option<serde_json::Value>,
) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.to_string(),
            data,
        }),
        id: Some(id),
    }
}

/// Send queued notifications and responses to the embedding page.
pub fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    // Send notifications first.
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }

    // Send responses second to maintain order.
    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

/// Send serialized message to parent window.
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {:?}", e);
                        }
                    } else {
                        warn!("No parent window available for message transmission");
                    }
                } else {
                    error!("Window object not available");
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {}", e);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        // No-op for non-WASM targets.
        let _ = message;
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn internal_error(message: &str) -> Self {
        Self {
            code: -32603,
            message: message.to_string(),
            data: None,
        }
    }
}
