//! Wire messages of the routing service, built on the [`expr`](crate::expr)
//! codec.

mod error;
mod fields;
pub mod record;
pub mod request;
pub mod response;
pub mod wps;

pub use error::ProtocolError;
pub use record::{
    LoadedRecord, LoadedServerState, SelectRecord, ServerState, encode_record, parse_record,
};
pub use request::{
    build_options, build_plugin, build_request, option_value_node, parse_plugin_options,
    parse_request,
};
pub use response::{
    parse_metrics, parse_option_descriptions, parse_option_value, parse_plugins, parse_results,
    parse_transport_modes, parse_transport_networks,
};
pub use wps::{
    ExceptionReport, ExecuteInput, Operation, Outputs, capabilities_query, describe_process_query,
    execute_envelope, parse_exception_report, parse_execute_envelope, parse_outputs,
};
