pub mod recover_cluster;
