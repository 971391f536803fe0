mod remote_state_test;
