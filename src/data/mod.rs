pub mod connectors;

pub use connectors::{
    CsvConnector, DatReader, DatTable, DataValidator, EnvCondition, GenotypeRecord,
    InstructionMap, RunParams, SummaryTable,
};
