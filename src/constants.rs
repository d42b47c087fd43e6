pub const LOG_BYTES_IN_KBYTE: u8 = 10;
pub const BYTES_IN_KBYTE: u64 = 1 << LOG_BYTES_IN_KBYTE;

pub const LOG_BYTES_IN_MBYTE: u8 = 20;
pub const BYTES_IN_MBYTE: u64 = 1 << LOG_BYTES_IN_MBYTE;

pub const LOG_BYTES_IN_GBYTE: u8 = 30;
pub const BYTES_IN_GBYTE: u64 = 1 << LOG_BYTES_IN_GBYTE;

/// Fields per node in the flat node array: type, name, id, self_size, edge_count
pub const NODE_FIELD_COUNT: usize = 5;
pub const NODE_TYPE_OFFSET: usize = 0;
pub const NODE_NAME_OFFSET: usize = 1;
pub const NODE_ID_OFFSET: usize = 2;
pub const NODE_SELF_SIZE_OFFSET: usize = 3;
pub const NODE_EDGE_COUNT_OFFSET: usize = 4;

/// Fields per edge in the flat edge array: type, name_or_index, to_node
pub const EDGE_FIELD_COUNT: usize = 3;
pub const EDGE_TYPE_OFFSET: usize = 0;
pub const EDGE_NAME_OFFSET: usize = 1;
pub const EDGE_TO_NODE_OFFSET: usize = 2;

/// Name V8 gives to function context objects
pub const CONTEXT_CLASS: &str = "system / Context";
