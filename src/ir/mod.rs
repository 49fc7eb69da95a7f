pub mod symtab;
pub mod tree;

pub use symtab::{
    EntryId, LookupScope, SymbolAttribute, SymbolTable, SymbolTableEntry, SymbolTableKey,
    SymbolTableStack,
};
pub use tree::{IntermediateCode, Node, NodeAttribute, NodeId, NodeKey, NodeType};
