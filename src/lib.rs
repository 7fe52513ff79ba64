pub mod constants;
pub mod error;
pub mod rnn {
    pub mod step_1_sequence_preparation;
    pub mod step_2_batch_collation;
    pub mod step_3_rnn_model_arch;
    pub mod step_4_train_model;
    pub mod step_5_evaluation;
}
pub mod util {
    pub mod plotting;
    pub mod pre_processor;
}
