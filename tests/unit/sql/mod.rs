pub mod ddl_test;
