mod scoring;
mod store;
mod timer;
mod topic;
