use crate::auth::otp::OtpPurpose;
use crate::mail::OutgoingMail;

pub fn otp_mail(to: &str, purpose: OtpPurpose, code: &str, ttl_secs: u64) -> OutgoingMail {
    let minutes = (ttl_secs / 60).max(1);
    let unit = if minutes == 1 { "minute" } else { "minutes" };
    let (subject, action) = match purpose {
        OtpPurpose::VerifyEmail => ("Verify your HireHub email", "verify your email address"),
        OtpPurpose::ResetPassword => ("Reset your HireHub password", "reset your password"),
    };

    OutgoingMail {
        to: to.to_string(),
        subject: subject.to_string(),
        body: format!(
            "Your one-time code is {code}.\n\n\
             Enter it in HireHub to {action}. The code expires in {minutes} {unit} \
             and can only be used once.\n\n\
             If you did not request this, you can ignore this message."
        ),
    }
}

pub fn application_received_mail(
    to: &str,
    job_title: &str,
    candidate_name: &str,
) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: format!("New application for {job_title}"),
        body: format!(
            "{candidate_name} applied to your posting \"{job_title}\".\n\n\
             Sign in to HireHub to review the application and the candidate's profile."
        ),
    }
}
