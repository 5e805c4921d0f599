// USV operator console - stream reconciliation and mission lifecycle
//
// Folds the vehicle's keyed reading and position streams into bounded
// derived state (sensor snapshot, quality class, connectivity, chart
// series, track history) and manages the waypoint mission through its
// add/clear/send lifecycle against the realtime store.
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::mission_manager::{DispatchAck, Notification};
pub use application::store_gateway::{RecordBatch, StoreGateway};
pub use application::telemetry_reducer::ConnectivityState;
pub use domain::mission::{
    DispatchStatus, Mission, MissionLogEntry, MissionStatus, Waypoint,
};
pub use domain::position::{TRAIL_CAPACITY, Trail, VehiclePosition};
pub use domain::quality::QualityClass;
pub use domain::reading::{ChartPoint, Reading, SensorSnapshot};
pub use infrastructure::config::{StoreConfig, load_store_config};
pub use infrastructure::rtdb_store::RtdbStore;
pub use presentation::console::{Console, NotificationReceiver};
