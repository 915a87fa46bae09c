//! Instruction templates for the five classification tasks.

use mailtriage_core::ClassificationTask;

/// System prompt for a task.
pub fn system_prompt(task: ClassificationTask) -> &'static str {
    match task {
        ClassificationTask::RequestType => {
            "You are a helpful assistant for classifying commercial loan-related emails."
        }
        ClassificationTask::Sentiment => "You are a helpful assistant for sentiment analysis.",
        ClassificationTask::Intent => {
            "You are a helpful assistant for intent classification in commercial loan related emails."
        }
        ClassificationTask::Entities => {
            "You are a helpful assistant for extracting entities from commercial loan related emails."
        }
        ClassificationTask::Spam => {
            "You are a helpful assistant for spam detection in commercial loan related emails."
        }
    }
}

/// Completion budget for a task.
pub fn max_tokens(task: ClassificationTask) -> u32 {
    match task {
        ClassificationTask::RequestType | ClassificationTask::Entities => 150,
        ClassificationTask::Sentiment | ClassificationTask::Intent => 50,
        ClassificationTask::Spam => 10,
    }
}

/// User prompt for a task, with the message content embedded.
pub fn user_prompt(task: ClassificationTask, content: &str) -> String {
    let instruction = match task {
        ClassificationTask::RequestType => {
            r#"Analyze the email and attachments. Classify it into loan-related categories. Possible request types include the following, and there can be more:
- Loan Completion
- Interest Rate Change
- Address Change
- Prepayment Charges
- Multiple Requests (list sub-request types if needed)
- Inbound money movement
- Outbound money movement

Respond with JSON only, shaped like this: {"requestType": "Loan Completion", "subRequestTypes": ["Address Change"], "confidenceScore": 0.92}
confidenceScore must be a number between 0 and 1."#
        }
        ClassificationTask::Sentiment => {
            "Analyze the sentiment of the following email content. Classify it as Positive, Negative, or Neutral."
        }
        ClassificationTask::Intent => {
            r#"Identify the intent of the following email. Possible intents include the following, and there can be more:
- Loan Application
- Query
- Complaint
- Feedback
- Other"#
        }
        ClassificationTask::Entities => {
            r#"Extract the entities from the email content, such as the following, and add more if found:
- Customer Name
- Loan Amount
- Account Number

Respond with a flat JSON object of string values only, shaped like this:
{
    "customerName": "John Doe",
    "loanAmount": "$50,000",
    "accountNumber": "123456789"
}"#
        }
        ClassificationTask::Spam => {
            "Determine concisely whether the following email is spam or not spam."
        }
    };

    format!("{}\n\nEmail Content:\n\"{}\"\n", instruction, content)
}
