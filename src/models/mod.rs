pub mod quiz_question;
