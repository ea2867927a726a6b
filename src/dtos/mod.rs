pub mod marketdtos;
