pub mod backup;
pub mod context;
pub mod device_store;
pub mod form;
pub mod store;
pub mod transport;

pub use backup::{capture_backup, restore_backup};
pub use context::DeviceContext;
pub use device_store::device_store;
pub use form::{BlockForm, FormError, FormTarget};
pub use store::{
    ActionContext, FieldKind, MappedStore, StoreAction, StoreChange, StoreDefinition, StoreError,
    StoreSnapshot,
};
pub use transport::{
    DeviceTransport, MidiLink, MissingDeviceTransport, SharedTransport, SimulatedDevice,
    SysExTransport, TransportError,
};
