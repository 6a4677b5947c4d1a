mod csv;
mod types;
mod validator;
mod dat;
mod inst_set;
mod cmd_log;
mod table;

pub use csv::CsvConnector;
pub use types::{DatTable, GenotypeRecord, LegendStyle};
pub use validator::DataValidator;
pub use dat::DatReader;
pub use inst_set::InstructionMap;
pub use cmd_log::{EnvCondition, RunParams};
pub use table::SummaryTable;
