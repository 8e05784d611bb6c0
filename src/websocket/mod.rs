//! WebSocket Dashboard Sessions
//!
//! Every WebSocket connection is one dashboard session with its own
//! auto-refresh flag and render loop.
//!
//! ## Architecture
//!
//! - **ConnectionHub**: Tracks live sessions and enforces the session limit
//! - **Handler**: Upgrades connections and wires them to a session driver
//! - **Messages**: Defines client and server message formats
//!
//! ## Example
//!
//! ```javascript
//! // Browser
//! const ws = new WebSocket('ws://localhost:8501/ws');
//!
//! ws.onmessage = (event) => {
//!   const msg = JSON.parse(event.data);
//!   if (msg.type === 'dashboard') draw(msg.view);
//! };
//!
//! button.onclick = () => ws.send(JSON.stringify({type: 'toggle_auto_refresh'}));
//! ```

mod handler;
mod hub;
mod messages;

pub use handler::websocket_handler;
pub use hub::{ConnectionHub, HubConfig, HubError};
pub use messages::{ClientMessage, ServerMessage};
