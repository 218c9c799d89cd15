pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{block, dim, error, header, name, name_list, section, status, success, summary_row, warn};
pub use progress::Spinner;
pub use table::{DatabaseRow, TableBuilder, databases_table, stats_table};
pub use theme::{Theme, theme};
